//! Criterion benchmarks for grid sweeps.
//!
//! Run with: `cargo bench -p gridlab-runner`
//!
//! Measures the default MA+RSI grid sequentially and on the rayon pool, plus
//! window-matrix construction over an evaluated result set.

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gridlab_core::synthetic::random_walk_bars;
use gridlab_runner::{ParamGrid, ParamSweep, RankingMetric};

fn bench_default_grid(c: &mut Criterion) {
    let start = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();
    let mut group = c.benchmark_group("ma_rsi_default_grid");
    group.sample_size(20);

    for bars in [500usize, 2500] {
        let prices = random_walk_bars("BENCH", start, bars).unwrap();
        let grid = ParamGrid::ma_rsi_default();

        for parallel in [false, true] {
            let id = if parallel { "parallel" } else { "sequential" };
            let sweep = ParamSweep::new(RankingMetric::CumulativeReturn).with_parallelism(parallel);
            group.bench_with_input(BenchmarkId::new(id, bars), &prices, |b, prices| {
                b.iter(|| {
                    let _ = sweep.sweep(black_box(prices), black_box(&grid), None);
                });
            });
        }
    }
    group.finish();
}

fn bench_window_matrix(c: &mut Criterion) {
    let start = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();
    let prices = random_walk_bars("BENCH", start, 1000).unwrap();
    let results = ParamSweep::new(RankingMetric::Sharpe)
        .sweep(&prices, &ParamGrid::ma_rsi_default(), None)
        .unwrap();

    c.bench_function("window_matrix", |b| {
        b.iter(|| black_box(&results).window_matrix());
    });
}

criterion_group!(benches, bench_default_grid, bench_window_matrix);
criterion_main!(benches);
