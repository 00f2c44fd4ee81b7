//! Engine error types.
//!
//! Only two conditions are failures inside the engine: a parameter that can
//! never describe a valid backtest, and input data that would break the
//! causality guarantees if processed. Short histories and zero-variance
//! returns are ordinary outcomes and never surface here.

use thiserror::Error;

/// Errors raised by the backtesting engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("malformed input at bar {index}: {reason}")]
    MalformedInput { index: usize, reason: String },

    #[error("length mismatch: {what} has {actual} entries, price series has {expected}")]
    LengthMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },
}

impl EngineError {
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn malformed(index: usize, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            index,
            reason: reason.into(),
        }
    }

    /// True for every flavour of rejected input data (as opposed to a bad parameter).
    pub fn is_malformed_input(&self) -> bool {
        !matches!(self, Self::InvalidParameter { .. })
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
