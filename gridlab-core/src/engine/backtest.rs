//! Single backtest: indicators → intent → lag → returns → metrics.

use serde::Serialize;

use crate::components::indicator::IndicatorSet;
use crate::components::signal::{build_signal, classify, Classifier};
use crate::domain::{
    ExecutedPositionSeries, PositionSeries, PriceSeries, ReturnSeries, StrategyKind,
    StrategyParams,
};
use crate::error::{EngineError, Result};
use crate::metrics::{aggregate, Metrics};

use super::lag::apply_lag;
use super::returns::compute_returns;

/// Outcome of one backtest. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestResult {
    /// BLAKE3 hash of the serialized params.
    pub run_id: String,
    pub params: StrategyParams,
    /// Compounded net return.
    pub cumulative_return: f64,
    pub sharpe_ratio: f64,
    pub trade_count: usize,
    /// Compounded return before fees.
    pub gross_return: f64,
    /// Same value as `cumulative_return`.
    pub net_return: f64,
    /// `gross_return - net_return`.
    pub fee_drag: f64,
    pub max_drawdown: f64,
    pub exposure: f64,
    pub bar_count: usize,
}

impl BacktestResult {
    fn from_metrics(params: &StrategyParams, metrics: &Metrics, bar_count: usize) -> Self {
        Self {
            run_id: params.run_id(),
            params: *params,
            cumulative_return: metrics.cumulative_return,
            sharpe_ratio: metrics.sharpe_ratio,
            trade_count: metrics.trade_count,
            gross_return: metrics.gross_return,
            net_return: metrics.cumulative_return,
            fee_drag: metrics.gross_return - metrics.cumulative_return,
            max_drawdown: metrics.max_drawdown,
            exposure: metrics.exposure,
            bar_count,
        }
    }
}

/// Every intermediate series of a backtest, for inspection and export.
#[derive(Debug, Clone)]
pub struct BacktestTrace {
    pub indicators: IndicatorSet,
    pub intent: PositionSeries,
    pub executed: ExecutedPositionSeries,
    pub returns: ReturnSeries,
    pub metrics: Metrics,
    pub result: BacktestResult,
}

/// Run one parameterization over `prices`.
///
/// Classifier strategies need a `classifier`; the other kinds ignore it.
pub fn run_backtest(
    prices: &PriceSeries,
    params: &StrategyParams,
    risk_free_daily: f64,
    classifier: Option<&dyn Classifier>,
) -> Result<BacktestResult> {
    run_backtest_traced(prices, params, risk_free_daily, classifier).map(|t| t.result)
}

/// Like [`run_backtest`], keeping every intermediate series.
pub fn run_backtest_traced(
    prices: &PriceSeries,
    params: &StrategyParams,
    risk_free_daily: f64,
    classifier: Option<&dyn Classifier>,
) -> Result<BacktestTrace> {
    let mut indicators = IndicatorSet::compute(prices, params)?;
    if matches!(params.kind(), StrategyKind::Classifier) {
        let classifier = classifier.ok_or_else(|| {
            EngineError::invalid("classifier", "classifier strategy needs a prediction source")
        })?;
        classifier.check_alignment(prices)?;
        indicators = indicators.with_predictions(classify(prices, classifier))?;
    }

    let intent = build_signal(params.kind()).generate(&indicators);
    let executed = apply_lag(&intent);
    let returns = compute_returns(prices, &executed, params.fee_rate(), params.return_mode())?;
    let metrics = aggregate(&returns, risk_free_daily);
    let result = BacktestResult::from_metrics(params, &metrics, prices.len());

    Ok(BacktestTrace {
        indicators,
        intent,
        executed,
        returns,
        metrics,
        result,
    })
}
