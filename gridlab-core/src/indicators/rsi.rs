//! Relative Strength Index (RSI).
//!
//! Exponentially weighted averages of gains and losses with decay
//! alpha = 1 / period (center of mass period - 1), seeded at the first bar
//! with zero gain and zero loss and updated recursively:
//! avg = alpha * x + (1 - alpha) * avg_prev.
//!
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Lookback: 1. Defined from the first bar with a price change, whatever the
//! period; the period only sets the smoothing.
//! Edge case: avg_loss == 0 → RSI = 100 (including a flat series).

use crate::components::indicator::Indicator;
use crate::domain::{IndicatorSeries, PriceSeries};
use crate::error::{EngineError, Result};

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Result<Self> {
        if period < 1 {
            return Err(EngineError::invalid("rsi period", "must be >= 1"));
        }
        Ok(Self {
            period,
            name: format!("rsi_{period}"),
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        1
    }

    fn compute(&self, prices: &PriceSeries) -> IndicatorSeries {
        let closes = prices.closes();
        let n = closes.len();
        let mut values = vec![None; n];

        let alpha = 1.0 / self.period as f64;
        let mut avg_gain = 0.0;
        let mut avg_loss = 0.0;

        for i in 1..n {
            let change = closes[i] - closes[i - 1];
            let gain = change.max(0.0);
            let loss = (-change).max(0.0);

            avg_gain = alpha * gain + (1.0 - alpha) * avg_gain;
            avg_loss = alpha * loss + (1.0 - alpha) * avg_loss;

            values[i] = Some(rsi_from_averages(avg_gain, avg_loss));
        }

        IndicatorSeries::new(self.name.clone(), values)
    }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_series};

    #[test]
    fn rsi_all_gains() {
        let prices = make_series(&[100.0, 101.0, 102.0, 103.0, 104.0, 105.0]);
        let result = Rsi::new(3).unwrap().compute(&prices);
        assert_approx(result.get(3).unwrap(), 100.0, 1e-9);
        assert_approx(result.get(5).unwrap(), 100.0, 1e-9);
    }

    #[test]
    fn rsi_all_losses() {
        let prices = make_series(&[105.0, 104.0, 103.0, 102.0, 101.0, 100.0]);
        let result = Rsi::new(3).unwrap().compute(&prices);
        assert_approx(result.get(3).unwrap(), 0.0, 1e-9);
    }

    #[test]
    fn rsi_flat_series_is_100() {
        let prices = make_series(&[50.0; 6]);
        let result = Rsi::new(2).unwrap().compute(&prices);
        assert_approx(result.get(2).unwrap(), 100.0, 1e-12);
    }

    #[test]
    fn rsi_exponential_smoothing_known_value() {
        // period 2 → alpha 0.5
        // i=1: +1 → gain 0.5,  loss 0    → RSI 100
        // i=2: +1 → gain 0.75, loss 0    → RSI 100
        // i=3: -1 → gain 0.375, loss 0.5 → RS 0.75 → RSI 100 - 100/1.75
        let prices = make_series(&[100.0, 101.0, 102.0, 101.0]);
        let result = Rsi::new(2).unwrap().compute(&prices);
        assert!(result.get(0).is_none());
        assert_approx(result.get(1).unwrap(), 100.0, 1e-12);
        assert_approx(result.get(2).unwrap(), 100.0, 1e-12);
        assert_approx(result.get(3).unwrap(), 100.0 - 100.0 / 1.75, 1e-12);
    }

    #[test]
    fn rsi_bounds() {
        let prices = make_series(&[100.0, 105.0, 98.0, 110.0, 95.0, 115.0, 90.0, 120.0]);
        let result = Rsi::new(3).unwrap().compute(&prices);
        for (i, v) in result.values().iter().enumerate() {
            if let Some(v) = v {
                assert!((0.0..=100.0).contains(v), "RSI out of bounds at bar {i}: {v}");
            }
        }
    }

    #[test]
    fn rsi_defined_before_period_elapses() {
        // period 14 → alpha 1/14
        // i=1: +1 → gain 1/14, loss 0     → RSI 100
        // i=2: -2 → gain 13/196, loss 2/14 → RS 13/28
        let prices = make_series(&[100.0, 101.0, 99.0]);
        let result = Rsi::new(14).unwrap().compute(&prices);
        assert_eq!(result.len(), 3);
        assert!(result.get(0).is_none());
        assert_approx(result.get(1).unwrap(), 100.0, 1e-12);
        assert_approx(result.get(2).unwrap(), 100.0 - 100.0 / (1.0 + 13.0 / 28.0), 1e-12);
    }

    #[test]
    fn rsi_single_bar_is_missing() {
        let result = Rsi::new(14).unwrap().compute(&make_series(&[100.0]));
        assert!(result.is_all_missing());
    }

    #[test]
    fn rsi_lookback() {
        assert_eq!(Rsi::new(14).unwrap().lookback(), 1);
        assert!(Rsi::new(0).is_err());
    }
}
