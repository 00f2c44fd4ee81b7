//! Reporting and export: JSON, CSV, and Markdown artifact generation.
//!
//! Provides the export formats for sweep output:
//! - **JSON**: ranked results with full params
//! - **CSV**: ranked leaderboard, window matrix heatmap, per-day backtest trace
//! - **Markdown**: human-readable sweep report with the buy-and-hold benchmark

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gridlab_core::domain::{PriceSeries, StrategyKind};
use gridlab_core::engine::{equity_curve, BacktestResult, BacktestTrace};

use crate::sweep::{SweepResults, WindowMatrix};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize ranked results to pretty JSON.
pub fn export_json(results: &[BacktestResult]) -> Result<String> {
    serde_json::to_string_pretty(results).context("failed to serialize results to JSON")
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export ranked results as CSV, one row per combination.
///
/// Columns: rank, run_id, strategy, short_window, long_window, rsi_period,
/// rsi_threshold, fee_rate, return_mode, cumulative_return, gross_return,
/// net_return, fee_drag, sharpe_ratio, trade_count, max_drawdown, exposure,
/// bar_count
pub fn export_results_csv(results: &[BacktestResult]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "rank",
        "run_id",
        "strategy",
        "short_window",
        "long_window",
        "rsi_period",
        "rsi_threshold",
        "fee_rate",
        "return_mode",
        "cumulative_return",
        "gross_return",
        "net_return",
        "fee_drag",
        "sharpe_ratio",
        "trade_count",
        "max_drawdown",
        "exposure",
        "bar_count",
    ])?;

    for (i, r) in results.iter().enumerate() {
        let kind = r.params.kind();
        let (short, long) = kind
            .windows()
            .map(|(s, l)| (s.to_string(), l.to_string()))
            .unwrap_or_default();
        let (rsi_period, rsi_threshold) = match *kind {
            StrategyKind::MaRsi {
                rsi_period,
                rsi_threshold,
                ..
            } => (rsi_period.to_string(), rsi_threshold.to_string()),
            _ => (String::new(), String::new()),
        };
        wtr.write_record([
            &(i + 1).to_string(),
            &r.run_id,
            kind.name(),
            &short,
            &long,
            &rsi_period,
            &rsi_threshold,
            &r.params.fee_rate().to_string(),
            r.params.return_mode().as_str(),
            &format!("{:.6}", r.cumulative_return),
            &format!("{:.6}", r.gross_return),
            &format!("{:.6}", r.net_return),
            &format!("{:.6}", r.fee_drag),
            &format!("{:.4}", r.sharpe_ratio),
            &r.trade_count.to_string(),
            &format!("{:.6}", r.max_drawdown),
            &format!("{:.4}", r.exposure),
            &r.bar_count.to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export a window matrix as CSV: one row per short window, one column per
/// long window. Empty cells mark pairs with no valid combination.
pub fn export_window_matrix_csv(matrix: &WindowMatrix) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec![format!("short\\long ({})", matrix.metric)];
    header.extend(matrix.long_windows.iter().map(|l| l.to_string()));
    wtr.write_record(&header)?;

    for (short, row) in matrix.short_windows.iter().zip(&matrix.cells) {
        let mut record = vec![short.to_string()];
        record.extend(
            row.iter()
                .map(|cell| cell.map(|v| format!("{v:.6}")).unwrap_or_default()),
        );
        wtr.write_record(&record)?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export every intermediate series of one backtest, one row per date.
///
/// Columns: date, close, short_ma, long_ma, rsi, intent, executed,
/// trade_action, gross_return, net_return, equity
pub fn export_trace_csv(prices: &PriceSeries, trace: &BacktestTrace) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "date",
        "close",
        "short_ma",
        "long_ma",
        "rsi",
        "intent",
        "executed",
        "trade_action",
        "gross_return",
        "net_return",
        "equity",
    ])?;

    let num = |v: Option<f64>| v.map(|v| format!("{v:.6}")).unwrap_or_default();
    let ind = |series: &Option<gridlab_core::domain::IndicatorSeries>, i: usize| {
        num(series.as_ref().and_then(|s| s.get(i)))
    };

    // The equity curve has one point per defined net return, after a 1.0 seed.
    let curve = equity_curve(trace.returns.net());
    let mut point = 0;

    for (i, bar) in prices.bars().iter().enumerate() {
        let net = trace.returns.net()[i];
        if net.is_some() {
            point += 1;
        }
        let executed = trace
            .executed
            .get(i)
            .map(|p| (p.exposure() as u8).to_string())
            .unwrap_or_default();
        wtr.write_record([
            bar.date.to_string(),
            format!("{:.6}", bar.close),
            ind(&trace.indicators.short_ma, i),
            ind(&trace.indicators.long_ma, i),
            ind(&trace.indicators.rsi, i),
            (trace.intent.values()[i].exposure() as u8).to_string(),
            executed,
            trace.returns.trade_action()[i].to_string(),
            num(trace.returns.gross()[i]),
            num(net),
            format!("{:.6}", curve[point]),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Markdown reports ───────────────────────────────────────────────

/// Generate a Markdown report for a finished sweep.
pub fn generate_report(
    results: &SweepResults,
    prices: &PriceSeries,
    benchmark: f64,
    top: usize,
) -> String {
    let mut md = String::with_capacity(2048);

    md.push_str("# Sweep Report\n\n");

    // Metadata
    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    if let (Some(first), Some(last)) = (prices.first_date(), prices.last_date()) {
        md.push_str(&format!("| Period | {first} to {last} |\n"));
    }
    md.push_str(&format!("| Bars | {} |\n", prices.len()));
    md.push_str(&format!("| Ranking | {} |\n", results.metric()));
    md.push_str(&format!(
        "| Evaluated | {} of {} |\n",
        results.len(),
        results.total()
    ));
    if results.is_partial() {
        md.push_str("| Status | **PARTIAL (deadline reached)** |\n");
    }
    md.push_str(&format!(
        "| Buy & Hold | {:.2}% |\n",
        benchmark * 100.0
    ));
    md.push('\n');

    // Leaderboard
    md.push_str("## Leaderboard\n\n");
    md.push_str("| # | Params | Net Return | Gross Return | Fee Drag | Sharpe | Trades | Max DD |\n");
    md.push_str("| ---: | --- | ---: | ---: | ---: | ---: | ---: | ---: |\n");
    for (i, r) in results.top_n(top).iter().enumerate() {
        md.push_str(&format!(
            "| {} | {} | {:.2}% | {:.2}% | {:.2}% | {:.3} | {} | {:.2}% |\n",
            i + 1,
            r.params.label(),
            r.net_return * 100.0,
            r.gross_return * 100.0,
            r.fee_drag * 100.0,
            r.sharpe_ratio,
            r.trade_count,
            r.max_drawdown * 100.0,
        ));
    }
    md.push('\n');

    // Over-trading
    if let Some(m) = results.most_traded() {
        md.push_str("## Most Traded\n\n");
        md.push_str(&format!(
            "{} traded {} times: {:.2}% gross, {:.2}% net, {:.2}% lost to fees.\n\n",
            m.params.label(),
            m.trade_count,
            m.gross_return * 100.0,
            m.net_return * 100.0,
            m.fee_drag * 100.0,
        ));
    }

    md
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a sweep.
///
/// Writes into `output_dir` (created if missing):
/// - `results.json`: every ranked result
/// - `results.csv`: ranked leaderboard
/// - `window_matrix.csv`: short × long heatmap (window strategies only)
/// - `report.md`: Markdown summary
///
/// Returns the paths written.
pub fn save_artifacts(
    results: &SweepResults,
    prices: &PriceSeries,
    benchmark: f64,
    top: usize,
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir: {}", output_dir.display()))?;

    let mut files = vec![
        ("results.json", export_json(results.all())?),
        ("results.csv", export_results_csv(results.all())?),
        ("report.md", generate_report(results, prices, benchmark, top)),
    ];
    let matrix = results.window_matrix();
    if !matrix.is_empty() {
        files.push(("window_matrix.csv", export_window_matrix_csv(&matrix)?));
    }

    let mut written = Vec::with_capacity(files.len());
    for (name, content) in files {
        let path = output_dir.join(name);
        std::fs::write(&path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitness::RankingMetric;
    use crate::sweep::{ParamGrid, ParamSweep};
    use gridlab_core::domain::StrategyParams;
    use gridlab_core::engine::run_backtest_traced;

    fn prices() -> PriceSeries {
        let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        PriceSeries::from_closes(start, &[100.0, 102.0, 101.0, 105.0, 104.0, 108.0]).unwrap()
    }

    fn sweep() -> SweepResults {
        let grid = ParamGrid {
            short_windows: vec![1, 2],
            long_windows: vec![2, 3],
            ..ParamGrid::ma_crossover_default()
        };
        ParamSweep::new(RankingMetric::CumulativeReturn)
            .sweep(&prices(), &grid, None)
            .unwrap()
    }

    #[test]
    fn results_csv_has_one_row_per_result() {
        let results = sweep();
        let csv = export_results_csv(results.all()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), results.len() + 1);
        assert!(lines[0].starts_with("rank,run_id,strategy"));
        assert!(lines[1].starts_with("1,"));
    }

    #[test]
    fn results_csv_spells_return_mode_like_json() {
        let results = sweep();
        let csv = export_results_csv(results.all()).unwrap();
        let mut rdr = csv::Reader::from_reader(csv.as_bytes());
        let col = rdr
            .headers()
            .unwrap()
            .iter()
            .position(|h| h == "return_mode")
            .unwrap();
        for row in rdr.records() {
            assert_eq!(&row.unwrap()[col], "close_to_close");
        }

        let json = export_json(results.all()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["params"]["return_mode"], "close_to_close");
    }

    #[test]
    fn json_lists_every_result() {
        let results = sweep();
        let json = export_json(results.all()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), results.len());
        assert_eq!(parsed[0]["params"]["kind"]["type"], "ma_crossover");
    }

    #[test]
    fn window_matrix_csv_layout() {
        let csv = export_window_matrix_csv(&sweep().window_matrix()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        // header + short windows 1 and 2
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with(",2,3"));
        // 2/2 is not a valid pair
        assert!(lines[2].starts_with("2,,"));
    }

    #[test]
    fn trace_csv_has_one_row_per_bar() {
        let p = prices();
        let params = StrategyParams::ma_crossover(1, 2, 0.001).unwrap();
        let trace = run_backtest_traced(&p, &params, 0.0, None).unwrap();
        let csv = export_trace_csv(&p, &trace).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), p.len() + 1);
        // first date: no executed position, no return, equity 1.0
        assert!(lines[1].ends_with(",0,,0,,,1.000000"));
    }

    #[test]
    fn report_mentions_benchmark_and_leader() {
        let results = sweep();
        let md = generate_report(&results, &prices(), 0.08, 5);
        assert!(md.contains("| Buy & Hold | 8.00% |"));
        let best = results.best().unwrap().params.label();
        assert!(md.contains(&best));
    }

    #[test]
    fn artifacts_written_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let written = save_artifacts(&sweep(), &prices(), 0.08, 5, dir.path()).unwrap();
        assert_eq!(written.len(), 4);
        for path in written {
            assert!(path.exists());
        }
    }
}
