//! Property tests for sweep ranking.
//!
//! For arbitrary positive price paths: the ranking is sorted by the chosen
//! metric, scheduling never changes the order, and every valid grid
//! combination appears exactly once.

use std::collections::HashSet;

use chrono::NaiveDate;
use gridlab_core::domain::PriceSeries;
use gridlab_runner::{ParamGrid, ParamSweep, RankingMetric};
use proptest::prelude::*;

fn series(closes: &[f64]) -> PriceSeries {
    let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    PriceSeries::from_closes(start, closes).unwrap()
}

fn small_grid() -> ParamGrid {
    ParamGrid {
        short_windows: vec![1, 2, 3, 5],
        long_windows: vec![3, 5, 8],
        rsi_thresholds: vec![50.0, 100.0],
        fee_rates: vec![0.0, 0.002],
        ..ParamGrid::ma_rsi_default()
    }
}

fn metric_strategy() -> impl Strategy<Value = RankingMetric> {
    prop::sample::select(RankingMetric::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn ranking_is_sorted_and_schedule_independent(
        closes in prop::collection::vec(50.0f64..150.0, 2..60),
        metric in metric_strategy(),
    ) {
        let prices = series(&closes);
        let grid = small_grid();

        let parallel = ParamSweep::new(metric).sweep(&prices, &grid, None).unwrap();
        let sequential = ParamSweep::new(metric)
            .with_parallelism(false)
            .sweep(&prices, &grid, None)
            .unwrap();

        let values: Vec<f64> = parallel.all().iter().map(|r| metric.extract(r)).collect();
        prop_assert!(values.windows(2).all(|w| w[0] >= w[1]));
        prop_assert_eq!(parallel.all(), sequential.all());
    }

    #[test]
    fn every_valid_combination_appears_once(
        closes in prop::collection::vec(50.0f64..150.0, 2..40),
    ) {
        let prices = series(&closes);
        let grid = small_grid();
        let expected = grid.generate().unwrap().len();

        let results = ParamSweep::new(RankingMetric::CumulativeReturn)
            .sweep(&prices, &grid, None)
            .unwrap();
        let ids: HashSet<&str> = results.all().iter().map(|r| r.run_id.as_str()).collect();

        prop_assert_eq!(results.len(), expected);
        prop_assert_eq!(ids.len(), expected);
        for r in results.all() {
            let (short, long) = r.params.kind().windows().unwrap();
            prop_assert!(short < long);
        }
    }
}
