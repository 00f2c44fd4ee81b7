//! Moving average crossover as a state rule, not an event detector.
//!
//! Holds while the short SMA is strictly above the long SMA, flat otherwise.
//! Dates where either average is still warming up are flat.

use crate::components::indicator::IndicatorSet;
use crate::domain::Position;

use super::SignalGenerator;

/// Short-over-long SMA rule.
///
/// # Indicator dependencies
/// Reads `IndicatorSet::short_ma` and `IndicatorSet::long_ma`.
#[derive(Debug, Clone)]
pub struct MaCrossover {
    pub short_window: usize,
    pub long_window: usize,
}

impl MaCrossover {
    pub fn new(short_window: usize, long_window: usize) -> Self {
        Self {
            short_window,
            long_window,
        }
    }
}

/// `Some(true)` when short > long at `index`, `None` if either is missing.
pub(crate) fn short_above_long(indicators: &IndicatorSet, index: usize) -> Option<bool> {
    let short = indicators.short_ma.as_ref()?.get(index)?;
    let long = indicators.long_ma.as_ref()?.get(index)?;
    Some(short > long)
}

impl SignalGenerator for MaCrossover {
    fn name(&self) -> &str {
        "ma_crossover"
    }

    fn warmup_bars(&self) -> usize {
        self.long_window.saturating_sub(1)
    }

    fn intent(&self, indicators: &IndicatorSet, index: usize) -> Position {
        Position::from_bool(short_above_long(indicators, index).unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PriceSeries, StrategyParams};
    use chrono::NaiveDate;

    fn indicators(closes: &[f64], short: usize, long: usize) -> IndicatorSet {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let prices = PriceSeries::from_closes(start, closes).unwrap();
        let params = StrategyParams::ma_crossover(short, long, 0.0).unwrap();
        IndicatorSet::compute(&prices, &params).unwrap()
    }

    #[test]
    fn worked_example_intent() {
        // sma_1 = price, sma_2 = {-, 101, 101.5, 103}
        // 0: long missing → flat
        // 1: 102 > 101    → hold
        // 2: 101 > 101.5? → flat
        // 3: 105 > 103    → hold
        let set = indicators(&[100.0, 102.0, 101.0, 105.0], 1, 2);
        let signal = MaCrossover::new(1, 2).generate(&set);
        assert_eq!(
            signal.values(),
            &[Position::Flat, Position::Hold, Position::Flat, Position::Hold]
        );
    }

    #[test]
    fn equal_averages_are_flat() {
        let set = indicators(&[100.0, 100.0, 100.0], 1, 2);
        let signal = MaCrossover::new(1, 2).generate(&set);
        assert!(signal.values().iter().all(|p| *p == Position::Flat));
    }

    #[test]
    fn missing_indicators_are_flat() {
        let set = IndicatorSet::default();
        assert_eq!(MaCrossover::new(1, 2).intent(&set, 0), Position::Flat);
    }

    #[test]
    fn warmup_matches_long_window() {
        assert_eq!(MaCrossover::new(5, 20).warmup_bars(), 19);
    }
}
