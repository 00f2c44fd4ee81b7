//! Serializable sweep configuration.
//!
//! A sweep file is TOML; every key is optional and falls back to the
//! default grid:
//!
//! ```toml
//! strategy = "ma_rsi"
//! short_windows = [5, 10, 20]
//! long_windows = [20, 40, 60]
//! rsi_thresholds = [70.0, 85.0, 100.0]
//! fee_rates = [0.001]
//! ranking = "sharpe"
//! risk_free_rate = 0.02
//! ```

use std::path::Path;
use std::time::Duration;

use gridlab_core::domain::{ReturnMode, DEFAULT_RSI_PERIOD};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fitness::RankingMetric;
use crate::sweep::{ParamGrid, ParamSweep, StrategyFamily};

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything needed to reproduce a sweep, apart from the data itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SweepConfig {
    pub strategy: StrategyFamily,
    pub short_windows: Vec<usize>,
    pub long_windows: Vec<usize>,
    pub rsi_thresholds: Vec<f64>,
    pub rsi_period: usize,
    pub fee_rates: Vec<f64>,
    pub return_mode: ReturnMode,
    pub ranking: RankingMetric,
    /// Annual risk-free rate; divided by 252 for the daily Sharpe input.
    pub risk_free_rate: f64,
    pub parallel: bool,
    /// Stop dispatching combinations after this many seconds.
    pub time_budget_secs: Option<u64>,
    /// Rows shown and exported in the leaderboard.
    pub top_n: usize,
}

impl Default for SweepConfig {
    fn default() -> Self {
        let grid = ParamGrid::ma_rsi_default();
        Self {
            strategy: StrategyFamily::MaCrossover,
            short_windows: grid.short_windows,
            long_windows: grid.long_windows,
            rsi_thresholds: grid.rsi_thresholds,
            rsi_period: DEFAULT_RSI_PERIOD,
            fee_rates: grid.fee_rates,
            return_mode: ReturnMode::CloseToClose,
            ranking: RankingMetric::CumulativeReturn,
            risk_free_rate: 0.0,
            parallel: true,
            time_budget_secs: None,
            top_n: 10,
        }
    }
}

impl SweepConfig {
    /// Load a sweep config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse a sweep config from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize back to TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Reject shapes the grid cannot expand.
    ///
    /// Per-value checks (window >= 1, fee >= 0, threshold range) happen when
    /// the grid is expanded, so they fail the same way for config files and
    /// programmatic grids.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fee_rates.is_empty() {
            return Err(ConfigError::Invalid("fee_rates must not be empty".into()));
        }
        if self.strategy != StrategyFamily::Classifier
            && (self.short_windows.is_empty() || self.long_windows.is_empty())
        {
            return Err(ConfigError::Invalid(
                "short_windows and long_windows must not be empty".into(),
            ));
        }
        if self.strategy == StrategyFamily::MaRsi && self.rsi_thresholds.is_empty() {
            return Err(ConfigError::Invalid(
                "rsi_thresholds must not be empty for ma_rsi".into(),
            ));
        }
        if !self.risk_free_rate.is_finite() {
            return Err(ConfigError::Invalid("risk_free_rate must be finite".into()));
        }
        Ok(())
    }

    /// The parameter grid this config describes.
    pub fn grid(&self) -> ParamGrid {
        ParamGrid {
            family: self.strategy,
            short_windows: self.short_windows.clone(),
            long_windows: self.long_windows.clone(),
            rsi_thresholds: self.rsi_thresholds.clone(),
            rsi_period: self.rsi_period,
            fee_rates: self.fee_rates.clone(),
            return_mode: self.return_mode,
        }
    }

    /// A sweep executor with this config's options.
    pub fn sweep(&self) -> ParamSweep {
        let sweep = ParamSweep::new(self.ranking)
            .with_parallelism(self.parallel)
            .with_risk_free_rate(self.risk_free_rate);
        match self.time_budget_secs {
            Some(secs) => sweep.with_time_budget(Duration::from_secs(secs)),
            None => sweep,
        }
    }
}
