//! StrategyParams: the configuration identifying one backtest run.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Default RSI period (center-of-mass 13).
pub const DEFAULT_RSI_PERIOD: usize = 14;

/// Which signal rule drives the position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategyKind {
    /// Hold while the short SMA is above the long SMA.
    MaCrossover {
        short_window: usize,
        long_window: usize,
    },
    /// MA crossover, additionally requiring RSI below a threshold.
    MaRsi {
        short_window: usize,
        long_window: usize,
        rsi_period: usize,
        rsi_threshold: f64,
    },
    /// Positions come from an external classifier's predictions.
    Classifier,
}

impl StrategyKind {
    /// (short, long) SMA windows, if the rule uses them.
    pub fn windows(&self) -> Option<(usize, usize)> {
        match *self {
            Self::MaCrossover {
                short_window,
                long_window,
            }
            | Self::MaRsi {
                short_window,
                long_window,
                ..
            } => Some((short_window, long_window)),
            Self::Classifier => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::MaCrossover { .. } => "ma_crossover",
            Self::MaRsi { .. } => "ma_rsi",
            Self::Classifier => "classifier",
        }
    }
}

/// How the raw market return of a date is measured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnMode {
    /// (close[t] - close[t-1]) / close[t-1]
    #[default]
    CloseToClose,
    /// (close[t] - open[t]) / open[t]
    Intraday,
}

impl ReturnMode {
    /// Same spelling as the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CloseToClose => "close_to_close",
            Self::Intraday => "intraday",
        }
    }
}

/// Validated parameters of a single backtest.
///
/// Fields are private: the only way to obtain a value is through a
/// constructor, so every instance satisfies the window and fee invariants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StrategyParams {
    kind: StrategyKind,
    fee_rate: f64,
    return_mode: ReturnMode,
}

impl StrategyParams {
    pub fn new(kind: StrategyKind, fee_rate: f64, return_mode: ReturnMode) -> Result<Self> {
        validate_kind(&kind)?;
        if !fee_rate.is_finite() || fee_rate < 0.0 {
            return Err(EngineError::invalid(
                "fee_rate",
                format!("must be a finite value >= 0, got {fee_rate}"),
            ));
        }
        Ok(Self {
            kind,
            fee_rate,
            return_mode,
        })
    }

    pub fn ma_crossover(short_window: usize, long_window: usize, fee_rate: f64) -> Result<Self> {
        Self::new(
            StrategyKind::MaCrossover {
                short_window,
                long_window,
            },
            fee_rate,
            ReturnMode::CloseToClose,
        )
    }

    pub fn ma_rsi(
        short_window: usize,
        long_window: usize,
        rsi_threshold: f64,
        fee_rate: f64,
    ) -> Result<Self> {
        Self::new(
            StrategyKind::MaRsi {
                short_window,
                long_window,
                rsi_period: DEFAULT_RSI_PERIOD,
                rsi_threshold,
            },
            fee_rate,
            ReturnMode::CloseToClose,
        )
    }

    pub fn classifier(fee_rate: f64) -> Result<Self> {
        Self::new(StrategyKind::Classifier, fee_rate, ReturnMode::CloseToClose)
    }

    /// Same parameters measured with a different return mode.
    pub fn with_return_mode(mut self, return_mode: ReturnMode) -> Self {
        self.return_mode = return_mode;
        self
    }

    pub fn kind(&self) -> &StrategyKind {
        &self.kind
    }

    pub fn fee_rate(&self) -> f64 {
        self.fee_rate
    }

    pub fn return_mode(&self) -> ReturnMode {
        self.return_mode
    }

    /// Compact human label, e.g. `10/60/70@0.001`.
    pub fn label(&self) -> String {
        let rule = match self.kind {
            StrategyKind::MaCrossover {
                short_window,
                long_window,
            } => format!("{short_window}/{long_window}"),
            StrategyKind::MaRsi {
                short_window,
                long_window,
                rsi_threshold,
                ..
            } => format!("{short_window}/{long_window}/{rsi_threshold}"),
            StrategyKind::Classifier => "classifier".to_string(),
        };
        format!("{rule}@{}", self.fee_rate)
    }

    /// Deterministic content hash of these parameters.
    ///
    /// Two runs with identical params share a run id regardless of where
    /// in a grid they were evaluated.
    pub fn run_id(&self) -> String {
        // Serializing a struct of plain numbers and enums cannot fail.
        let json = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}

fn validate_kind(kind: &StrategyKind) -> Result<()> {
    if let Some((short, long)) = kind.windows() {
        if short < 1 {
            return Err(EngineError::invalid("short_window", "must be >= 1"));
        }
        if long < 1 {
            return Err(EngineError::invalid("long_window", "must be >= 1"));
        }
        if short >= long {
            return Err(EngineError::invalid(
                "short_window",
                format!("must be below long_window ({short} >= {long})"),
            ));
        }
    }
    if let StrategyKind::MaRsi {
        rsi_period,
        rsi_threshold,
        ..
    } = *kind
    {
        if rsi_period < 1 {
            return Err(EngineError::invalid("rsi_period", "must be >= 1"));
        }
        if !(0.0..=100.0).contains(&rsi_threshold) {
            return Err(EngineError::invalid(
                "rsi_threshold",
                format!("must lie in [0, 100], got {rsi_threshold}"),
            ));
        }
    }
    Ok(())
}
