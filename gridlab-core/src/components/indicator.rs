//! Indicator trait and the per-run indicator container.
//!
//! Indicators are pure functions: price history in, date-aligned series out.
//! They are computed once per backtest, then read by index when the signal
//! rule is evaluated.

use crate::domain::{IndicatorSeries, PositionSeries, PriceSeries, StrategyKind, StrategyParams};
use crate::error::{EngineError, Result};
use crate::indicators::{Rsi, Sma};

/// Trait for indicators.
///
/// Indicators take a full price series and produce an output series of the
/// same length. The first `lookback()` values are missing (warmup).
///
/// # Look-ahead contamination guard
/// No indicator value at bar t may depend on price data from bar t+1 or later.
/// Every indicator must pass the truncated-vs-full series test.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20", "rsi_14").
    fn name(&self) -> &str;

    /// Number of bars before the indicator produces a defined value.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire series.
    fn compute(&self, prices: &PriceSeries) -> IndicatorSeries;
}

/// Everything a signal rule may read for one backtest.
#[derive(Debug, Clone, Default)]
pub struct IndicatorSet {
    len: usize,
    pub short_ma: Option<IndicatorSeries>,
    pub long_ma: Option<IndicatorSeries>,
    pub rsi: Option<IndicatorSeries>,
    pub predictions: Option<PositionSeries>,
}

impl IndicatorSet {
    /// Compute the indicators `params` needs over `prices`.
    ///
    /// Classifier strategies need no indicators; attach their predictions
    /// with [`IndicatorSet::with_predictions`].
    pub fn compute(prices: &PriceSeries, params: &StrategyParams) -> Result<Self> {
        let mut set = Self {
            len: prices.len(),
            ..Self::default()
        };
        if let Some((short, long)) = params.kind().windows() {
            set.short_ma = Some(Sma::new(short)?.compute(prices));
            set.long_ma = Some(Sma::new(long)?.compute(prices));
        }
        if let StrategyKind::MaRsi { rsi_period, .. } = *params.kind() {
            set.rsi = Some(Rsi::new(rsi_period)?.compute(prices));
        }
        Ok(set)
    }

    /// Attach a prediction column; it must cover every price date.
    pub fn with_predictions(mut self, predictions: PositionSeries) -> Result<Self> {
        if predictions.len() != self.len {
            return Err(EngineError::LengthMismatch {
                what: "predictions".into(),
                expected: self.len,
                actual: predictions.len(),
            });
        }
        self.predictions = Some(predictions);
        Ok(self)
    }

    /// Number of dates covered.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
