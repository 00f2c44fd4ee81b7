//! Ranking metric: which result field a sweep is sorted by.

use std::fmt;
use std::str::FromStr;

use gridlab_core::engine::BacktestResult;
use serde::{Deserialize, Serialize};

/// Which metric to rank results by. Higher is always better.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingMetric {
    #[default]
    CumulativeReturn,
    GrossReturn,
    NetReturn,
    Sharpe,
}

impl RankingMetric {
    pub const ALL: [RankingMetric; 4] = [
        Self::CumulativeReturn,
        Self::GrossReturn,
        Self::NetReturn,
        Self::Sharpe,
    ];

    /// Extract the relevant value from a result.
    pub fn extract(&self, result: &BacktestResult) -> f64 {
        match self {
            Self::CumulativeReturn => result.cumulative_return,
            Self::GrossReturn => result.gross_return,
            Self::NetReturn => result.net_return,
            Self::Sharpe => result.sharpe_ratio,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CumulativeReturn => "cumulative_return",
            Self::GrossReturn => "gross_return",
            Self::NetReturn => "net_return",
            Self::Sharpe => "sharpe",
        }
    }
}

impl fmt::Display for RankingMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RankingMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "cumulative_return" | "cumulative" => Ok(Self::CumulativeReturn),
            "gross_return" | "gross" => Ok(Self::GrossReturn),
            "net_return" | "net" => Ok(Self::NetReturn),
            "sharpe" | "sharpe_ratio" => Ok(Self::Sharpe),
            other => Err(format!(
                "unknown ranking metric '{other}' (expected one of: cumulative_return, gross_return, net_return, sharpe)"
            )),
        }
    }
}
