//! MA crossover with an RSI overbought filter.
//!
//! Holds when short SMA > long SMA AND RSI < threshold. The RSI comparison is
//! strict: RSI exactly at the threshold is flat. A threshold of 100 therefore
//! still blocks days where RSI is pinned at 100 (no losses in the window).

use crate::components::indicator::IndicatorSet;
use crate::domain::Position;

use super::ma_crossover::short_above_long;
use super::SignalGenerator;

#[derive(Debug, Clone)]
pub struct MaRsiFilter {
    pub short_window: usize,
    pub long_window: usize,
    pub rsi_period: usize,
    pub rsi_threshold: f64,
}

impl MaRsiFilter {
    pub fn new(short_window: usize, long_window: usize, rsi_period: usize, rsi_threshold: f64) -> Self {
        Self {
            short_window,
            long_window,
            rsi_period,
            rsi_threshold,
        }
    }

    fn rsi_below_threshold(&self, indicators: &IndicatorSet, index: usize) -> Option<bool> {
        let rsi = indicators.rsi.as_ref()?.get(index)?;
        Some(rsi < self.rsi_threshold)
    }
}

impl SignalGenerator for MaRsiFilter {
    fn name(&self) -> &str {
        "ma_rsi"
    }

    fn warmup_bars(&self) -> usize {
        self.long_window.saturating_sub(1).max(1)
    }

    fn intent(&self, indicators: &IndicatorSet, index: usize) -> Position {
        let trend = short_above_long(indicators, index).unwrap_or(false);
        let not_overbought = self.rsi_below_threshold(indicators, index).unwrap_or(false);
        Position::from_bool(trend && not_overbought)
    }
}
