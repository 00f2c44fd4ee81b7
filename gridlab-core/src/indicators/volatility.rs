//! Rolling volatility.
//!
//! Sample standard deviation (n - 1) of close-to-close returns over the
//! trailing `window` returns. The first return exists at bar 1, so the first
//! defined value is at bar `window`.

use crate::components::indicator::Indicator;
use crate::domain::{IndicatorSeries, PriceSeries};
use crate::error::{EngineError, Result};
use crate::metrics::std_dev;

#[derive(Debug, Clone)]
pub struct Volatility {
    window: usize,
    name: String,
}

impl Volatility {
    /// A sample deviation needs at least two observations.
    pub fn new(window: usize) -> Result<Self> {
        if window < 2 {
            return Err(EngineError::invalid("volatility window", "must be >= 2"));
        }
        Ok(Self {
            window,
            name: format!("volatility_{window}"),
        })
    }
}

impl Indicator for Volatility {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.window
    }

    fn compute(&self, prices: &PriceSeries) -> IndicatorSeries {
        let closes = prices.closes();
        let n = closes.len();
        let mut values = vec![None; n];

        let returns: Vec<f64> = closes.windows(2).map(|w| (w[1] - w[0]) / w[0]).collect();

        // returns[k] belongs to bar k + 1
        for i in self.window..n {
            values[i] = Some(std_dev(&returns[i - self.window..i]));
        }

        IndicatorSeries::new(self.name.clone(), values)
    }
}
