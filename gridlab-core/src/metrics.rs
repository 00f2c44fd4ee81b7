//! Performance metrics: pure reductions of a return series to scalars.
//!
//! Missing entries (the first bar in close-to-close mode) are skipped by
//! every statistic; they never count as a zero return.

use serde::{Deserialize, Serialize};

use crate::domain::{PriceSeries, ReturnSeries};
use crate::engine::returns::{cumulative_return, equity_curve};

/// Annualization factor for daily returns.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Standard deviations below this are treated as zero.
const VARIANCE_EPSILON: f64 = 1e-15;

/// Aggregate statistics for one return series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Compounded net return.
    pub cumulative_return: f64,
    /// Compounded return before fees.
    pub gross_return: f64,
    /// Mean of defined daily net returns.
    pub mean_return: f64,
    /// Sample standard deviation of defined daily net returns.
    pub std_return: f64,
    pub sharpe_ratio: f64,
    pub trade_count: usize,
    /// Worst peak-to-trough loss of the net equity curve, as a non-positive fraction.
    pub max_drawdown: f64,
    /// Fraction of return-bearing days spent holding.
    pub exposure: f64,
}

/// Reduce `returns` to scalar metrics.
///
/// `risk_free_daily` is subtracted from the mean daily return before the
/// Sharpe ratio is annualized.
pub fn aggregate(returns: &ReturnSeries, risk_free_daily: f64) -> Metrics {
    let net = defined(returns.net());
    Metrics {
        cumulative_return: cumulative_return(returns.net()),
        gross_return: cumulative_return(returns.gross()),
        mean_return: mean(&net),
        std_return: std_dev(&net),
        sharpe_ratio: sharpe_ratio(&net, risk_free_daily),
        trade_count: returns.trade_count(),
        max_drawdown: max_drawdown(&equity_curve(returns.net())),
        exposure: exposure(returns),
    }
}

fn defined(values: &[Option<f64>]) -> Vec<f64> {
    values.iter().flatten().copied().collect()
}

fn exposure(returns: &ReturnSeries) -> f64 {
    let (days, held) = returns
        .net()
        .iter()
        .zip(returns.positions())
        .filter(|(r, _)| r.is_some())
        .fold((0usize, 0usize), |(days, held), (_, p)| {
            (days + 1, held + p.is_hold() as usize)
        });
    if days == 0 {
        0.0
    } else {
        held as f64 / days as f64
    }
}

/// Arithmetic mean; 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n − 1); 0.0 for fewer than two values.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

/// Annualized Sharpe ratio of daily returns.
///
/// Sharpe = (mean − rf) / std × √252. Returns 0.0 when the deviation is zero
/// or fewer than two returns are available.
pub fn sharpe_ratio(returns: &[f64], risk_free_daily: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let std = std_dev(returns);
    if std < VARIANCE_EPSILON {
        return 0.0;
    }
    (mean(returns) - risk_free_daily) / std * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Maximum drawdown of an equity curve, as a non-positive fraction.
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    if equity_curve.len() < 2 {
        return 0.0;
    }
    let mut peak = equity_curve[0];
    let mut max_dd = 0.0_f64;

    for &eq in equity_curve {
        if eq > peak {
            peak = eq;
        }
        if peak > 0.0 {
            let dd = (eq - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// Passive benchmark: last close / first close − 1; 0.0 for under two bars.
pub fn buy_and_hold_return(prices: &PriceSeries) -> f64 {
    match prices.bars() {
        [first, .., last] => last.close / first.close - 1.0,
        _ => 0.0,
    }
}

/// Convert an annual rate to the per-day rate `aggregate` expects.
pub fn annual_to_daily(rate: f64) -> f64 {
    rate / TRADING_DAYS_PER_YEAR
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Position;

    fn returns(net: &[Option<f64>], positions: &[Position], actions: &[u8]) -> ReturnSeries {
        ReturnSeries {
            gross: net.to_vec(),
            net: net.to_vec(),
            trade_action: actions.to_vec(),
            positions: positions.to_vec(),
        }
    }

    #[test]
    fn std_dev_is_sample() {
        // mean 2.5, squared deviations sum 5, n-1 = 3
        let s = std_dev(&[1.0, 2.0, 3.0, 4.0]);
        assert!((s - (5.0_f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(std_dev(&[1.0]), 0.0);
    }

    #[test]
    fn sharpe_zero_on_constant_returns() {
        assert_eq!(sharpe_ratio(&[0.01; 10], 0.0), 0.0);
        assert_eq!(sharpe_ratio(&[0.0; 10], 0.0), 0.0);
        assert_eq!(sharpe_ratio(&[0.05], 0.0), 0.0);
    }

    #[test]
    fn sharpe_known_value() {
        let r = [0.01, -0.01, 0.02, 0.0];
        let expected = mean(&r) / std_dev(&r) * 252.0_f64.sqrt();
        assert!((sharpe_ratio(&r, 0.0) - expected).abs() < 1e-12);
    }

    #[test]
    fn risk_free_lowers_sharpe() {
        let r = [0.01, -0.01, 0.02, 0.0];
        assert!(sharpe_ratio(&r, 0.001) < sharpe_ratio(&r, 0.0));
    }

    #[test]
    fn max_drawdown_known() {
        let eq = vec![1.0, 1.1, 0.9, 0.95];
        let expected = (0.9 - 1.1) / 1.1;
        assert!((max_drawdown(&eq) - expected).abs() < 1e-10);
    }

    #[test]
    fn max_drawdown_monotonic_increase() {
        let eq: Vec<f64> = (0..100).map(|i| 1.0 + i as f64 * 0.01).collect();
        assert_eq!(max_drawdown(&eq), 0.0);
        assert_eq!(max_drawdown(&[]), 0.0);
    }

    #[test]
    fn aggregate_skips_missing_entries() {
        let r = returns(
            &[None, Some(0.1), Some(-0.05)],
            &[Position::Flat, Position::Hold, Position::Hold],
            &[0, 1, 0],
        );
        let m = aggregate(&r, 0.0);
        assert!((m.cumulative_return - (1.1 * 0.95 - 1.0)).abs() < 1e-12);
        assert!((m.mean_return - 0.025).abs() < 1e-12);
        assert_eq!(m.trade_count, 1);
        assert_eq!(m.exposure, 1.0);
    }

    #[test]
    fn aggregate_all_flat_is_degenerate() {
        let r = returns(
            &[None, Some(0.0), Some(0.0)],
            &[Position::Flat; 3],
            &[0, 0, 0],
        );
        let m = aggregate(&r, 0.0);
        assert_eq!(m.sharpe_ratio, 0.0);
        assert_eq!(m.cumulative_return, 0.0);
        assert_eq!(m.exposure, 0.0);
        assert_eq!(m.max_drawdown, 0.0);
    }

    #[test]
    fn buy_and_hold_uses_endpoints() {
        let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let prices = PriceSeries::from_closes(start, &[100.0, 90.0, 110.0]).unwrap();
        assert!((buy_and_hold_return(&prices) - 0.1).abs() < 1e-12);
        let single = PriceSeries::from_closes(start, &[100.0]).unwrap();
        assert_eq!(buy_and_hold_return(&single), 0.0);
    }

    #[test]
    fn annual_rate_conversion() {
        assert!((annual_to_daily(0.0252) - 0.0001).abs() < 1e-15);
    }
}
