//! PriceBar: one daily observation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Daily observation for a single instrument.
///
/// Only `close` is mandatory. `open` is required by the intraday return
/// variant; the remaining fields are carried for collaborators (and for
/// classifiers that read the bar window).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
    pub volume: Option<u64>,
}

impl PriceBar {
    /// Close-only bar.
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            open: None,
            high: None,
            low: None,
            close,
            volume: None,
        }
    }

    /// Fully populated OHLCV bar.
    pub fn ohlcv(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            date,
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close,
            volume: Some(volume),
        }
    }

    /// Check the fields the engine divides by or compares against.
    ///
    /// Prices must be finite and strictly positive; high/low, when both are
    /// present, must not be inverted.
    pub(crate) fn validate(&self, index: usize) -> Result<()> {
        if !self.close.is_finite() || self.close <= 0.0 {
            return Err(EngineError::malformed(
                index,
                format!("close must be a positive finite price, got {}", self.close),
            ));
        }
        for (field, value) in [("open", self.open), ("high", self.high), ("low", self.low)] {
            if let Some(v) = value {
                if !v.is_finite() || v <= 0.0 {
                    return Err(EngineError::malformed(
                        index,
                        format!("{field} must be a positive finite price, got {v}"),
                    ));
                }
            }
        }
        if let (Some(high), Some(low)) = (self.high, self.low) {
            if high < low {
                return Err(EngineError::malformed(
                    index,
                    format!("high {high} is below low {low}"),
                ));
            }
        }
        Ok(())
    }

    /// Open-to-close return for the day, if the open is known.
    pub fn intraday_return(&self) -> Option<f64> {
        self.open.map(|open| (self.close - open) / open)
    }
}
