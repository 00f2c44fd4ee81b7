//! GridLab Core: vectorized backtesting engine.
//!
//! This crate contains the pure computation behind a parameter sweep:
//! - Domain value types (price bars and series, positions, params)
//! - Indicators (SMA, RSI, rolling volatility)
//! - Signal rules (MA crossover, MA + RSI filter, external classifier)
//! - Execution lag, return calculation with per-trade fees
//! - Metric aggregation and a deterministic synthetic price generator
//!
//! Nothing here performs I/O or logging.

pub mod components;
pub mod domain;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod metrics;
pub mod synthetic;

pub use error::{EngineError, Result};
