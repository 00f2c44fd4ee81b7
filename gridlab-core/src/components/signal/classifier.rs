//! External classifier as a signal source.
//!
//! The engine treats a classifier as an opaque oracle: given the bar history
//! up to and including a date, it answers hold or flat. Training, features
//! and validation all live outside this crate.

use chrono::NaiveDate;

use crate::components::indicator::IndicatorSet;
use crate::domain::{Position, PositionSeries, PriceBar, PriceSeries};
use crate::error::{EngineError, Result};

use super::SignalGenerator;

/// Capability interface for prediction sources.
pub trait Classifier: Send + Sync {
    fn name(&self) -> &str;

    /// Predict for the last bar of `window`.
    ///
    /// `window` is `bars[..=t]`: the history up to and including the decision
    /// date, never anything later.
    fn predict(&self, window: &[PriceBar]) -> Position;

    /// Reject a price series this classifier cannot answer for.
    ///
    /// Model-backed classifiers accept any history. Sources that carry their
    /// own dates override this so a date they do not know fails the run
    /// instead of reading as flat.
    fn check_alignment(&self, _prices: &PriceSeries) -> Result<()> {
        Ok(())
    }
}

/// Run `classifier` over every date of `prices`.
///
/// Each call only receives the prefix ending at its own date, so the
/// resulting intent is causal whatever the classifier does internally.
pub fn classify(prices: &PriceSeries, classifier: &dyn Classifier) -> PositionSeries {
    let bars = prices.bars();
    (0..bars.len())
        .map(|t| classifier.predict(&bars[..=t]))
        .collect()
}

/// Precomputed predictions aligned 1:1 with a price series.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionStream {
    name: String,
    dates: Vec<NaiveDate>,
    values: Vec<Position>,
}

impl PredictionStream {
    /// Align `(date, label)` rows to `prices`.
    ///
    /// There must be exactly one row per price date, in the same order, and
    /// every label must be 0 or 1.
    pub fn new(prices: &PriceSeries, rows: &[(NaiveDate, i64)]) -> Result<Self> {
        if rows.len() != prices.len() {
            return Err(EngineError::LengthMismatch {
                what: "predictions".into(),
                expected: prices.len(),
                actual: rows.len(),
            });
        }
        let mut values = Vec::with_capacity(rows.len());
        for (i, (bar, &(date, label))) in prices.bars().iter().zip(rows).enumerate() {
            if date != bar.date {
                return Err(EngineError::malformed(
                    i,
                    format!("prediction dated {date} does not match price date {}", bar.date),
                ));
            }
            let position = Position::from_label(label).ok_or_else(|| {
                EngineError::malformed(i, format!("prediction must be 0 or 1, got {label}"))
            })?;
            values.push(position);
        }
        Ok(Self {
            name: "prediction_stream".into(),
            dates: prices.dates().collect(),
            values,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The aligned predictions as a position series.
    pub fn to_positions(&self) -> PositionSeries {
        PositionSeries::new(self.values.clone())
    }
}

impl Classifier for PredictionStream {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, window: &[PriceBar]) -> Position {
        window
            .last()
            .and_then(|bar| self.dates.binary_search(&bar.date).ok())
            .map(|i| self.values[i])
            .unwrap_or(Position::Flat)
    }

    fn check_alignment(&self, prices: &PriceSeries) -> Result<()> {
        if prices.len() != self.dates.len() {
            return Err(EngineError::LengthMismatch {
                what: format!("predictions '{}'", self.name),
                expected: prices.len(),
                actual: self.dates.len(),
            });
        }
        match prices.dates().zip(&self.dates).position(|(p, &s)| p != s) {
            Some(i) => Err(EngineError::malformed(
                i,
                format!(
                    "prediction dated {} does not match price date {}",
                    self.dates[i],
                    prices.bars()[i].date
                ),
            )),
            None => Ok(()),
        }
    }
}

/// Signal rule that passes the attached predictions through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassifierSignal;

impl SignalGenerator for ClassifierSignal {
    fn name(&self) -> &str {
        "classifier"
    }

    fn warmup_bars(&self) -> usize {
        0
    }

    fn intent(&self, indicators: &IndicatorSet, index: usize) -> Position {
        indicators
            .predictions
            .as_ref()
            .and_then(|p| p.get(index))
            .unwrap_or(Position::Flat)
    }
}
