//! Return calculation: executed position × realized market return, minus fees.

use crate::domain::{ExecutedPositionSeries, PriceSeries, ReturnMode, ReturnSeries};
use crate::error::{EngineError, Result};

/// Realized market return per date.
///
/// Close-to-close mode leaves the first date missing. Intraday mode needs an
/// open on every bar and defines every date.
pub fn raw_returns(prices: &PriceSeries, mode: ReturnMode) -> Result<Vec<Option<f64>>> {
    let bars = prices.bars();
    match mode {
        ReturnMode::CloseToClose => Ok((0..bars.len())
            .map(|t| {
                t.checked_sub(1)
                    .map(|prev| (bars[t].close - bars[prev].close) / bars[prev].close)
            })
            .collect()),
        ReturnMode::Intraday => {
            prices.require_open()?;
            Ok(bars.iter().map(|b| b.intraday_return()).collect())
        }
    }
}

/// Gross and net strategy returns for an executed position series.
///
/// - `trade_action[t] = |executed[t] − executed[t−1]|`, 0 on the first date
/// - `gross[t] = executed[t] × raw[t]`, missing where `raw[t]` is missing
/// - `net[t] = gross[t] − fee_rate × trade_action[t]`
///
/// A missing executed position counts as flat. Entering and exiting are
/// both charged.
pub fn compute_returns(
    prices: &PriceSeries,
    executed: &ExecutedPositionSeries,
    fee_rate: f64,
    mode: ReturnMode,
) -> Result<ReturnSeries> {
    if executed.len() != prices.len() {
        return Err(EngineError::LengthMismatch {
            what: "executed positions".into(),
            expected: prices.len(),
            actual: executed.len(),
        });
    }
    if !fee_rate.is_finite() || fee_rate < 0.0 {
        return Err(EngineError::invalid(
            "fee_rate",
            format!("must be finite and >= 0, got {fee_rate}"),
        ));
    }

    let raw = raw_returns(prices, mode)?;
    let positions: Vec<_> = (0..executed.len()).map(|t| executed.effective(t)).collect();

    let trade_action: Vec<u8> = (0..positions.len())
        .map(|t| match t {
            0 => 0,
            _ => (positions[t] != positions[t - 1]) as u8,
        })
        .collect();

    let gross: Vec<Option<f64>> = raw
        .iter()
        .zip(&positions)
        .map(|(r, p)| r.map(|r| p.exposure() * r))
        .collect();

    let net = gross
        .iter()
        .zip(&trade_action)
        .map(|(g, &a)| g.map(|g| g - fee_rate * f64::from(a)))
        .collect();

    Ok(ReturnSeries {
        gross,
        net,
        trade_action,
        positions,
    })
}

/// Compounded return Π(1 + r) − 1 over the defined entries.
pub fn cumulative_return(returns: &[Option<f64>]) -> f64 {
    returns.iter().flatten().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0
}

/// Running wealth starting at 1.0, one point per defined return.
pub fn equity_curve(returns: &[Option<f64>]) -> Vec<f64> {
    let mut curve = Vec::with_capacity(returns.len() + 1);
    let mut wealth = 1.0;
    curve.push(wealth);
    for r in returns.iter().flatten() {
        wealth *= 1.0 + r;
        curve.push(wealth);
    }
    curve
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Position::*, PositionSeries, PriceBar};
    use crate::engine::lag::apply_lag;
    use crate::indicators::{assert_approx, make_series, DEFAULT_EPSILON};

    #[test]
    fn close_to_close_first_missing() {
        let raw = raw_returns(&make_series(&[100.0, 110.0, 99.0]), ReturnMode::CloseToClose).unwrap();
        assert_eq!(raw[0], None);
        assert_approx(raw[1].unwrap(), 0.1, DEFAULT_EPSILON);
        assert_approx(raw[2].unwrap(), -0.1, DEFAULT_EPSILON);
    }

    #[test]
    fn intraday_requires_open() {
        let err = raw_returns(&make_series(&[100.0, 101.0]), ReturnMode::Intraday).unwrap_err();
        assert!(err.is_malformed_input());
    }

    #[test]
    fn intraday_uses_open_to_close() {
        let d = |day| chrono::NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        let prices = PriceSeries::new(vec![
            PriceBar::ohlcv(d(2), 100.0, 106.0, 99.0, 105.0, 1),
            PriceBar::ohlcv(d(3), 105.0, 105.0, 94.0, 94.5, 1),
        ])
        .unwrap();
        let raw = raw_returns(&prices, ReturnMode::Intraday).unwrap();
        assert_approx(raw[0].unwrap(), 0.05, DEFAULT_EPSILON);
        assert_approx(raw[1].unwrap(), -0.1, DEFAULT_EPSILON);
    }

    #[test]
    fn fee_charged_on_entry_and_exit() {
        let prices = make_series(&[100.0, 100.0, 100.0, 100.0]);
        let executed = apply_lag(&PositionSeries::new(vec![Hold, Flat, Flat, Flat]));
        let r = compute_returns(&prices, &executed, 0.01, ReturnMode::CloseToClose).unwrap();
        assert_eq!(r.trade_action(), &[0, 1, 1, 0]);
        assert_eq!(r.net(), &[None, Some(-0.01), Some(-0.01), Some(0.0)]);
        assert_eq!(r.trade_count(), 2);
    }

    #[test]
    fn flat_earns_nothing() {
        let prices = make_series(&[100.0, 150.0, 50.0]);
        let executed = apply_lag(&PositionSeries::flat(3));
        let r = compute_returns(&prices, &executed, 0.001, ReturnMode::CloseToClose).unwrap();
        assert_eq!(r.gross(), &[None, Some(0.0), Some(0.0)]);
        assert_eq!(cumulative_return(r.net()), 0.0);
    }

    #[test]
    fn rejects_mismatched_lengths_and_bad_fee() {
        let prices = make_series(&[100.0, 101.0]);
        let short = apply_lag(&PositionSeries::flat(1));
        assert!(matches!(
            compute_returns(&prices, &short, 0.0, ReturnMode::CloseToClose),
            Err(EngineError::LengthMismatch { .. })
        ));
        let executed = apply_lag(&PositionSeries::flat(2));
        assert!(compute_returns(&prices, &executed, -0.1, ReturnMode::CloseToClose).is_err());
        assert!(compute_returns(&prices, &executed, f64::NAN, ReturnMode::CloseToClose).is_err());
    }

    #[test]
    fn compounding_skips_missing() {
        let r = [None, Some(0.1), Some(-0.1)];
        assert_approx(cumulative_return(&r), 1.1 * 0.9 - 1.0, DEFAULT_EPSILON);
        assert_eq!(cumulative_return(&[]), 0.0);
        let curve = equity_curve(&r);
        assert_eq!(curve.len(), 3);
        assert_approx(curve[2], 0.99, DEFAULT_EPSILON);
    }
}
