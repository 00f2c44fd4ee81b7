//! Parameter sweep: grid expansion, parallel evaluation, deterministic ranking.

use std::collections::{BTreeSet, HashMap};
use std::time::{Duration, Instant};

use gridlab_core::components::signal::Classifier;
use gridlab_core::domain::{
    PriceSeries, ReturnMode, StrategyKind, StrategyParams, DEFAULT_RSI_PERIOD,
};
use gridlab_core::engine::{run_backtest, BacktestResult};
use gridlab_core::metrics::annual_to_daily;
use gridlab_core::EngineError;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::fitness::RankingMetric;

/// Errors from a sweep.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("classifier sweep needs a prediction source")]
    MissingClassifier,
}

/// Which signal rule a grid sweeps over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyFamily {
    #[default]
    MaCrossover,
    MaRsi,
    Classifier,
}

/// Parameter grid specification.
///
/// Defines the values of each axis; the sweep covers their cross product.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamGrid {
    pub family: StrategyFamily,
    pub short_windows: Vec<usize>,
    pub long_windows: Vec<usize>,
    /// Only used by [`StrategyFamily::MaRsi`].
    pub rsi_thresholds: Vec<f64>,
    pub rsi_period: usize,
    pub fee_rates: Vec<f64>,
    pub return_mode: ReturnMode,
}

impl ParamGrid {
    /// MA crossover grid.
    ///
    /// Short windows: 5, 10, 20, 60
    /// Long windows: 20, 60, 120, 240
    pub fn ma_crossover_default() -> Self {
        Self {
            family: StrategyFamily::MaCrossover,
            short_windows: vec![5, 10, 20, 60],
            long_windows: vec![20, 60, 120, 240],
            rsi_thresholds: vec![],
            rsi_period: DEFAULT_RSI_PERIOD,
            fee_rates: vec![0.001],
            return_mode: ReturnMode::CloseToClose,
        }
    }

    /// MA + RSI filter grid: the crossover windows × thresholds 70, 85, 100.
    pub fn ma_rsi_default() -> Self {
        Self {
            family: StrategyFamily::MaRsi,
            rsi_thresholds: vec![70.0, 85.0, 100.0],
            ..Self::ma_crossover_default()
        }
    }

    /// A single classifier run per fee rate.
    pub fn classifier(fee_rates: Vec<f64>) -> Self {
        Self {
            family: StrategyFamily::Classifier,
            short_windows: vec![],
            long_windows: vec![],
            fee_rates,
            ..Self::ma_crossover_default()
        }
    }

    /// Size of the raw cross product, before invalid window pairs are dropped.
    pub fn size(&self) -> usize {
        let fees = self.fee_rates.len();
        match self.family {
            StrategyFamily::MaCrossover => self.short_windows.len() * self.long_windows.len() * fees,
            StrategyFamily::MaRsi => {
                self.short_windows.len()
                    * self.long_windows.len()
                    * self.rsi_thresholds.len()
                    * fees
            }
            StrategyFamily::Classifier => fees,
        }
    }

    /// Expand the grid into validated params, in axis order.
    ///
    /// Window pairs with short >= long are skipped silently; any other
    /// invalid value fails the whole expansion.
    pub fn generate(&self) -> Result<Vec<StrategyParams>, EngineError> {
        let mut kinds = Vec::new();
        match self.family {
            StrategyFamily::Classifier => kinds.push(StrategyKind::Classifier),
            family => {
                for &short in &self.short_windows {
                    for &long in &self.long_windows {
                        // Skip invalid combinations (short >= long)
                        if short >= long {
                            debug!(short, long, "skipping window pair");
                            continue;
                        }
                        if family == StrategyFamily::MaRsi {
                            for &threshold in &self.rsi_thresholds {
                                kinds.push(StrategyKind::MaRsi {
                                    short_window: short,
                                    long_window: long,
                                    rsi_period: self.rsi_period,
                                    rsi_threshold: threshold,
                                });
                            }
                        } else {
                            kinds.push(StrategyKind::MaCrossover {
                                short_window: short,
                                long_window: long,
                            });
                        }
                    }
                }
            }
        }

        let mut params = Vec::with_capacity(kinds.len() * self.fee_rates.len());
        for kind in kinds {
            for &fee in &self.fee_rates {
                params.push(StrategyParams::new(kind, fee, self.return_mode)?);
            }
        }
        Ok(params)
    }
}

/// Parameter sweep executor.
///
/// Runs one backtest per grid point, optionally in parallel, then ranks.
#[derive(Debug, Clone)]
pub struct ParamSweep {
    metric: RankingMetric,
    parallel: bool,
    risk_free_daily: f64,
    deadline: Option<Instant>,
}

impl ParamSweep {
    pub fn new(metric: RankingMetric) -> Self {
        Self {
            metric,
            parallel: true,
            risk_free_daily: 0.0,
            deadline: None,
        }
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Annual risk-free rate for the Sharpe ratio.
    pub fn with_risk_free_rate(mut self, annual: f64) -> Self {
        self.risk_free_daily = annual_to_daily(annual);
        self
    }

    /// Stop dispatching new combinations once `deadline` has passed.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Deadline `budget` from now.
    pub fn with_time_budget(self, budget: Duration) -> Self {
        self.with_deadline(Instant::now() + budget)
    }

    pub fn metric(&self) -> RankingMetric {
        self.metric
    }

    /// Executes a parameter sweep over the given grid.
    pub fn sweep(
        &self,
        prices: &PriceSeries,
        grid: &ParamGrid,
        classifier: Option<&dyn Classifier>,
    ) -> Result<SweepResults, SweepError> {
        self.sweep_with_progress(prices, grid, classifier, |_, _, _| {})
    }

    /// Executes a sweep with progress reporting.
    ///
    /// The callback is invoked after each backtest completes with:
    /// - Grid index of the combination (0-based)
    /// - Total number of combinations
    /// - The completed result
    pub fn sweep_with_progress<F>(
        &self,
        prices: &PriceSeries,
        grid: &ParamGrid,
        classifier: Option<&dyn Classifier>,
        progress_callback: F,
    ) -> Result<SweepResults, SweepError>
    where
        F: Fn(usize, usize, &BacktestResult) + Send + Sync,
    {
        if grid.family == StrategyFamily::Classifier && classifier.is_none() {
            return Err(SweepError::MissingClassifier);
        }

        let started = Instant::now();
        let combos = grid.generate()?;
        let total = combos.len();
        info!(
            family = ?grid.family,
            combinations = total,
            skipped_invalid = grid.size() - total,
            bars = prices.len(),
            parallel = self.parallel,
            metric = %self.metric,
            "sweep started"
        );

        if prices.is_empty() {
            warn!("empty price series, nothing to evaluate");
            return Ok(SweepResults::new(Vec::new(), self.metric, total, started.elapsed()));
        }

        let evaluate = |(idx, params): (usize, &StrategyParams)| -> Result<Option<BacktestResult>, SweepError> {
            if self.deadline.is_some_and(|d| Instant::now() >= d) {
                return Ok(None);
            }
            let result = run_backtest(prices, params, self.risk_free_daily, classifier)?;
            progress_callback(idx, total, &result);
            Ok(Some(result))
        };

        let evaluated: Vec<Option<BacktestResult>> = if self.parallel {
            combos
                .par_iter()
                .enumerate()
                .map(evaluate)
                .collect::<Result<Vec<_>, _>>()?
        } else {
            combos
                .iter()
                .enumerate()
                .map(evaluate)
                .collect::<Result<Vec<_>, _>>()?
        };

        // Collected in grid order whatever the scheduling.
        let results: Vec<BacktestResult> = evaluated.into_iter().flatten().collect();
        if results.len() < total {
            warn!(
                evaluated = results.len(),
                total,
                "deadline reached, returning partial results"
            );
        }

        let sweep = SweepResults::new(results, self.metric, total, started.elapsed());
        if let Some(best) = sweep.best() {
            info!(
                evaluated = sweep.len(),
                best = %best.params.label(),
                value = self.metric.extract(best),
                elapsed_ms = sweep.elapsed.as_millis() as u64,
                "sweep finished"
            );
        }
        Ok(sweep)
    }
}

/// Rank `prices` over `grid` by `metric` with default options.
///
/// Pure and restartable: the same inputs always give the same ordering.
pub fn optimize(
    prices: &PriceSeries,
    grid: &ParamGrid,
    metric: RankingMetric,
) -> Result<Vec<BacktestResult>, SweepError> {
    Ok(ParamSweep::new(metric).sweep(prices, grid, None)?.into_ranked())
}

/// Ranked results from a parameter sweep.
#[derive(Debug, Clone)]
pub struct SweepResults {
    ranked: Vec<BacktestResult>,
    by_run_id: HashMap<String, usize>,
    metric: RankingMetric,
    total: usize,
    elapsed: Duration,
}

impl SweepResults {
    /// Rank `results` (in grid order) descending by `metric`.
    ///
    /// The sort is stable, so equal values keep grid order. NaN ranks last.
    fn new(
        mut results: Vec<BacktestResult>,
        metric: RankingMetric,
        total: usize,
        elapsed: Duration,
    ) -> Self {
        let key = |r: &BacktestResult| {
            let v = metric.extract(r);
            if v.is_nan() {
                f64::NEG_INFINITY
            } else {
                v
            }
        };
        results.sort_by(|a, b| key(b).total_cmp(&key(a)));

        let mut by_run_id = HashMap::with_capacity(results.len());
        for (i, r) in results.iter().enumerate() {
            by_run_id.entry(r.run_id.clone()).or_insert(i);
        }

        Self {
            ranked: results,
            by_run_id,
            metric,
            total,
            elapsed,
        }
    }

    /// All results, best first.
    pub fn all(&self) -> &[BacktestResult] {
        &self.ranked
    }

    pub fn into_ranked(self) -> Vec<BacktestResult> {
        self.ranked
    }

    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    pub fn metric(&self) -> RankingMetric {
        self.metric
    }

    /// Combinations in the grid after filtering, evaluated or not.
    pub fn total(&self) -> usize {
        self.total
    }

    /// True when a deadline cut the sweep short.
    pub fn is_partial(&self) -> bool {
        self.ranked.len() < self.total
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Gets a result by run id.
    pub fn get(&self, run_id: &str) -> Option<&BacktestResult> {
        self.by_run_id.get(run_id).map(|&i| &self.ranked[i])
    }

    /// Returns the top N results.
    pub fn top_n(&self, n: usize) -> &[BacktestResult] {
        &self.ranked[..n.min(self.ranked.len())]
    }

    /// Returns the best result.
    pub fn best(&self) -> Option<&BacktestResult> {
        self.ranked.first()
    }

    /// The result with the most trades; ties go to the better-ranked one.
    pub fn most_traded(&self) -> Option<&BacktestResult> {
        self.ranked
            .iter()
            .rev()
            .max_by_key(|r| r.trade_count)
    }

    /// Best metric value per (short, long) window pair.
    pub fn window_matrix(&self) -> WindowMatrix {
        WindowMatrix::from_ranked(&self.ranked, self.metric)
    }
}

/// Short × long grid of the best metric value per window pair.
///
/// Cells without any valid combination (short >= long, or not evaluated)
/// are `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowMatrix {
    pub metric: RankingMetric,
    pub short_windows: Vec<usize>,
    pub long_windows: Vec<usize>,
    /// `cells[i][j]` is the value for `short_windows[i]` × `long_windows[j]`.
    pub cells: Vec<Vec<Option<f64>>>,
}

impl WindowMatrix {
    fn from_ranked(ranked: &[BacktestResult], metric: RankingMetric) -> Self {
        let pairs: Vec<((usize, usize), f64)> = ranked
            .iter()
            .filter_map(|r| r.params.kind().windows().map(|w| (w, metric.extract(r))))
            .collect();
        let short_windows: Vec<usize> = pairs
            .iter()
            .map(|((s, _), _)| *s)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let long_windows: Vec<usize> = pairs
            .iter()
            .map(|((_, l), _)| *l)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut cells = vec![vec![None; long_windows.len()]; short_windows.len()];
        // Ranked best-first: the first value seen for a pair is its best.
        for ((s, l), value) in pairs {
            let (Ok(i), Ok(j)) = (short_windows.binary_search(&s), long_windows.binary_search(&l))
            else {
                continue;
            };
            cells[i][j].get_or_insert(value);
        }

        Self {
            metric,
            short_windows,
            long_windows,
            cells,
        }
    }

    pub fn get(&self, short: usize, long: usize) -> Option<f64> {
        let i = self.short_windows.binary_search(&short).ok()?;
        let j = self.long_windows.binary_search(&long).ok()?;
        self.cells[i][j]
    }

    pub fn is_empty(&self) -> bool {
        self.short_windows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridlab_core::synthetic::random_walk_bars;

    fn prices(n: usize) -> PriceSeries {
        let start = chrono::NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
        random_walk_bars("sweep_unit", start, n).unwrap()
    }

    fn small_grid() -> ParamGrid {
        ParamGrid {
            short_windows: vec![2, 5],
            long_windows: vec![5, 10, 20],
            ..ParamGrid::ma_crossover_default()
        }
    }

    #[test]
    fn test_param_grid_size() {
        // 4 short × 4 long × 1 fee = 16 raw combinations
        assert_eq!(ParamGrid::ma_crossover_default().size(), 16);
        // × 3 thresholds
        assert_eq!(ParamGrid::ma_rsi_default().size(), 48);
        assert_eq!(ParamGrid::classifier(vec![0.0, 0.001]).size(), 2);
    }

    #[test]
    fn test_param_grid_filters_invalid_combinations() {
        let combos = ParamGrid::ma_crossover_default().generate().unwrap();
        // Valid: 5×{20,60,120,240}, 10×{20,60,120,240}, 20×{60,120,240}, 60×{120,240}
        assert_eq!(combos.len(), 13);
        for p in &combos {
            let (s, l) = p.kind().windows().unwrap();
            assert!(s < l);
        }
    }

    #[test]
    fn test_param_grid_rejects_bad_values() {
        let grid = ParamGrid {
            fee_rates: vec![-0.01],
            ..small_grid()
        };
        assert!(matches!(
            grid.generate(),
            Err(EngineError::InvalidParameter { .. })
        ));
        let grid = ParamGrid {
            short_windows: vec![0],
            ..small_grid()
        };
        assert!(grid.generate().is_err());
    }

    #[test]
    fn test_sequential_and_parallel_agree() {
        let prices = prices(300);
        let grid = small_grid();
        let seq = ParamSweep::new(RankingMetric::Sharpe)
            .with_parallelism(false)
            .sweep(&prices, &grid, None)
            .unwrap();
        let par = ParamSweep::new(RankingMetric::Sharpe)
            .sweep(&prices, &grid, None)
            .unwrap();
        assert_eq!(seq.all(), par.all());
        assert_eq!(seq.len(), 5);
    }

    #[test]
    fn test_sorted_descending() {
        let results = ParamSweep::new(RankingMetric::CumulativeReturn)
            .sweep(&prices(300), &small_grid(), None)
            .unwrap();
        for pair in results.all().windows(2) {
            assert!(pair[0].cumulative_return >= pair[1].cumulative_return);
        }
        assert_eq!(results.best(), results.all().first());
        assert_eq!(results.top_n(2).len(), 2);
        assert_eq!(results.top_n(100).len(), 5);
    }

    #[test]
    fn test_ties_keep_grid_order() {
        // Too short for any window: every result is zero.
        let results = ParamSweep::new(RankingMetric::Sharpe)
            .sweep(&prices(3), &small_grid(), None)
            .unwrap();
        let labels: Vec<String> = results.all().iter().map(|r| r.params.label()).collect();
        assert_eq!(labels, ["2/5@0.001", "2/10@0.001", "2/20@0.001", "5/10@0.001", "5/20@0.001"]);
    }

    #[test]
    fn test_lookup_by_run_id() {
        let results = ParamSweep::new(RankingMetric::Sharpe)
            .sweep(&prices(200), &small_grid(), None)
            .unwrap();
        let target = StrategyParams::ma_crossover(5, 20, 0.001).unwrap();
        let found = results.get(&target.run_id()).unwrap();
        assert_eq!(found.params, target);
        assert!(results.get("missing").is_none());
    }

    #[test]
    fn test_expired_deadline_yields_empty_partial() {
        let results = ParamSweep::new(RankingMetric::Sharpe)
            .with_deadline(Instant::now())
            .sweep(&prices(200), &small_grid(), None)
            .unwrap();
        assert!(results.is_empty());
        assert!(results.is_partial());
        assert_eq!(results.total(), 5);
    }

    #[test]
    fn test_classifier_sweep_needs_source() {
        let err = ParamSweep::new(RankingMetric::Sharpe)
            .sweep(&prices(20), &ParamGrid::classifier(vec![0.0]), None)
            .unwrap_err();
        assert!(matches!(err, SweepError::MissingClassifier));
    }

    #[test]
    fn test_window_matrix_keeps_best() {
        let grid = ParamGrid {
            fee_rates: vec![0.0, 0.01],
            ..small_grid()
        };
        let results = ParamSweep::new(RankingMetric::CumulativeReturn)
            .sweep(&prices(300), &grid, None)
            .unwrap();
        let matrix = results.window_matrix();
        assert_eq!(matrix.short_windows, vec![2, 5]);
        assert_eq!(matrix.long_windows, vec![5, 10, 20]);
        assert_eq!(matrix.get(5, 5), None);
        let zero_fee = StrategyParams::ma_crossover(2, 10, 0.0).unwrap();
        let best = results.get(&zero_fee.run_id()).unwrap().cumulative_return;
        assert_eq!(matrix.get(2, 10), Some(best));
    }

    #[test]
    fn test_most_traded() {
        let results = ParamSweep::new(RankingMetric::Sharpe)
            .sweep(&prices(300), &small_grid(), None)
            .unwrap();
        let most = results.most_traded().unwrap();
        assert!(results.all().iter().all(|r| r.trade_count <= most.trade_count));
    }

    #[test]
    fn test_optimize_matches_sweep() {
        let p = prices(250);
        let ranked = optimize(&p, &small_grid(), RankingMetric::NetReturn).unwrap();
        let swept = ParamSweep::new(RankingMetric::NetReturn)
            .sweep(&p, &small_grid(), None)
            .unwrap();
        assert_eq!(ranked.as_slice(), swept.all());
    }
}
