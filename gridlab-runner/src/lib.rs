//! GridLab Runner: grid sweeps, configuration, data loading, ranking, export.
//!
//! This crate builds on `gridlab-core` to provide:
//! - CSV price and prediction loading with dataset hashing
//! - TOML sweep configuration
//! - Parallel parameter sweeps with a deterministic ranking
//! - JSON/CSV/Markdown export of ranked results and backtest traces

pub mod config;
pub mod data_loader;
pub mod export;
pub mod fitness;
pub mod sweep;

pub use config::{ConfigError, SweepConfig};
pub use data_loader::{
    dataset_hash, load_predictions, load_prices, read_predictions, read_prices, write_prices,
    LoadError, LoadOptions, LoadedData,
};
pub use export::{
    export_json, export_results_csv, export_trace_csv, export_window_matrix_csv,
    generate_report, save_artifacts,
};
pub use fitness::RankingMetric;
pub use sweep::{
    optimize, ParamGrid, ParamSweep, StrategyFamily, SweepError, SweepResults, WindowMatrix,
};
