//! Simple Moving Average (SMA).
//!
//! Rolling mean of close prices over a lookback window.
//! Lookback: period - 1 (first valid value at index period-1).

use crate::components::indicator::Indicator;
use crate::domain::{IndicatorSeries, PriceSeries};
use crate::error::{EngineError, Result};

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Result<Self> {
        if period < 1 {
            return Err(EngineError::invalid("sma window", "must be >= 1"));
        }
        Ok(Self {
            period,
            name: format!("sma_{period}"),
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, prices: &PriceSeries) -> IndicatorSeries {
        let closes = prices.closes();
        let n = closes.len();
        let mut values = vec![None; n];

        if n < self.period {
            return IndicatorSeries::new(self.name.clone(), values);
        }

        // Initial window sum, then roll forward. Closes are validated finite
        // by PriceSeries, so no NaN bookkeeping is needed.
        let mut sum: f64 = closes[..self.period].iter().sum();
        values[self.period - 1] = Some(sum / self.period as f64);

        for i in self.period..n {
            sum += closes[i] - closes[i - self.period];
            values[i] = Some(sum / self.period as f64);
        }

        IndicatorSeries::new(self.name.clone(), values)
    }
}
