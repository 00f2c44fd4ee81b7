//! Backtesting engine: vectorized, one pass per stage.
//!
//! A backtest runs four stages over whole series:
//!
//! 1. Indicators and signal intent (same-day data only)
//! 2. One-period execution lag
//! 3. Gross and net returns with per-trade fees
//! 4. Metric aggregation

pub mod backtest;
pub mod lag;
pub mod returns;

pub use backtest::{run_backtest, run_backtest_traced, BacktestResult, BacktestTrace};
pub use lag::apply_lag;
pub use returns::{compute_returns, cumulative_return, equity_curve, raw_returns};
