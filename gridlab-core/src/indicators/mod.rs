//! Concrete indicator implementations.
//!
//! Each indicator implements the `Indicator` trait from `components::indicator`.
//! The free functions below are the convenience entry points: they validate
//! the window and compute in one call.

pub mod rsi;
pub mod sma;
pub mod volatility;

pub use rsi::Rsi;
pub use sma::Sma;
pub use volatility::Volatility;

use crate::components::indicator::Indicator;
use crate::domain::{IndicatorSeries, PriceSeries};
use crate::error::Result;

/// Trailing simple moving average of closes.
pub fn compute_sma(prices: &PriceSeries, window: usize) -> Result<IndicatorSeries> {
    Ok(Sma::new(window)?.compute(prices))
}

/// Exponentially smoothed RSI of closes.
pub fn compute_rsi(prices: &PriceSeries, period: usize) -> Result<IndicatorSeries> {
    Ok(Rsi::new(period)?.compute(prices))
}

/// Rolling sample deviation of close-to-close returns.
pub fn compute_volatility(prices: &PriceSeries, window: usize) -> Result<IndicatorSeries> {
    Ok(Volatility::new(window)?.compute(prices))
}

/// Close-only series on consecutive days, for tests.
#[cfg(test)]
pub fn make_series(closes: &[f64]) -> PriceSeries {
    let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    PriceSeries::from_closes(start, closes).unwrap()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
