//! GridLab CLI: sweep, run, and synthetic data commands.
//!
//! Commands:
//! - `sweep`: grid-search a strategy family over a price CSV and write artifacts
//! - `run`: backtest one parameterization, optionally dumping its trace
//! - `synthetic`: write a deterministic random-walk price CSV

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use gridlab_core::components::signal::{Classifier, PredictionStream};
use gridlab_core::domain::{
    PriceSeries, ReturnMode, StrategyKind, StrategyParams, DEFAULT_RSI_PERIOD,
};
use gridlab_core::engine::{run_backtest_traced, BacktestResult};
use gridlab_core::metrics::{annual_to_daily, buy_and_hold_return};
use gridlab_core::synthetic::random_walk;
use gridlab_runner::{
    export_trace_csv, load_predictions, load_prices, save_artifacts, write_prices, LoadOptions,
    RankingMetric, StrategyFamily, SweepConfig, SweepResults,
};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "gridlab",
    about = "GridLab CLI: vectorized backtests and parameter grid search"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grid-search a strategy family and rank every combination.
    Sweep {
        #[command(flatten)]
        source: PriceSource,

        /// TOML sweep config. Flags below override its values.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Strategy family: ma_crossover, ma_rsi, classifier.
        #[arg(long)]
        strategy: Option<String>,

        /// Short SMA windows (comma separated).
        #[arg(long, value_delimiter = ',')]
        short: Option<Vec<usize>>,

        /// Long SMA windows (comma separated).
        #[arg(long, value_delimiter = ',')]
        long: Option<Vec<usize>>,

        /// RSI thresholds for ma_rsi (comma separated).
        #[arg(long, value_delimiter = ',')]
        rsi_thresholds: Option<Vec<f64>>,

        /// Fee rates per position change (comma separated).
        #[arg(long, value_delimiter = ',')]
        fees: Option<Vec<f64>>,

        /// Ranking metric: cumulative_return, gross_return, net_return, sharpe.
        #[arg(long)]
        ranking: Option<RankingMetric>,

        /// Annual risk-free rate for Sharpe.
        #[arg(long)]
        risk_free_rate: Option<f64>,

        /// Measure returns open-to-close instead of close-to-close.
        #[arg(long, default_value_t = false)]
        intraday: bool,

        /// Evaluate combinations on one thread.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// Stop dispatching combinations after this many seconds.
        #[arg(long)]
        time_budget: Option<u64>,

        /// Leaderboard rows to print and report.
        #[arg(long)]
        top: Option<usize>,

        /// `date,prediction` CSV for the classifier family.
        #[arg(long)]
        predictions: Option<PathBuf>,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Backtest a single parameterization.
    Run {
        #[command(flatten)]
        source: PriceSource,

        /// Strategy: ma_crossover, ma_rsi, classifier.
        #[arg(long, default_value = "ma_crossover")]
        strategy: String,

        #[arg(long, default_value_t = 10)]
        short: usize,

        #[arg(long, default_value_t = 60)]
        long: usize,

        #[arg(long, default_value_t = 70.0)]
        rsi_threshold: f64,

        #[arg(long, default_value_t = DEFAULT_RSI_PERIOD)]
        rsi_period: usize,

        /// Fee rate per position change.
        #[arg(long, default_value_t = 0.001)]
        fee: f64,

        /// Annual risk-free rate for Sharpe.
        #[arg(long, default_value_t = 0.0)]
        risk_free_rate: f64,

        #[arg(long, default_value_t = false)]
        intraday: bool,

        /// `date,prediction` CSV for the classifier strategy.
        #[arg(long)]
        predictions: Option<PathBuf>,

        /// Write the per-date trace CSV here.
        #[arg(long)]
        trace: Option<PathBuf>,
    },
    /// Write a deterministic random-walk price CSV.
    Synthetic {
        /// Seed label; the same label always gives the same series.
        #[arg(long, default_value = "SYNTH")]
        label: String,

        /// Start date (YYYY-MM-DD).
        #[arg(long, default_value = "2020-01-01")]
        start: NaiveDate,

        /// End date (YYYY-MM-DD).
        #[arg(long, default_value = "2024-12-31")]
        end: NaiveDate,

        /// Output CSV path.
        #[arg(long, default_value = "synthetic.csv")]
        output: PathBuf,
    },
}

/// Where prices come from: a CSV file or the synthetic generator.
#[derive(Args)]
struct PriceSource {
    /// Price CSV with `date` and `close` (or `adj_close`) columns.
    #[arg(long, conflicts_with = "synthetic")]
    prices: Option<PathBuf>,

    /// Generate a random walk seeded by this label instead of reading a file.
    #[arg(long)]
    synthetic: Option<String>,

    /// Prefer `adj_close` over `close`.
    #[arg(long, default_value_t = false)]
    adjusted: bool,

    /// Start date (YYYY-MM-DD).
    #[arg(long)]
    start: Option<NaiveDate>,

    /// End date (YYYY-MM-DD).
    #[arg(long)]
    end: Option<NaiveDate>,
}

impl PriceSource {
    fn load(&self) -> Result<PriceSeries> {
        match (&self.prices, &self.synthetic) {
            (Some(path), _) => {
                let opts = LoadOptions {
                    adjusted: self.adjusted,
                    start: self.start,
                    end: self.end,
                };
                let loaded = load_prices(path, &opts)?;
                info!(hash = %loaded.dataset_hash, "dataset");
                Ok(loaded.series)
            }
            (None, Some(label)) => {
                let start = self.start.unwrap_or(date(2020, 1, 1)?);
                let end = self.end.unwrap_or(date(2024, 12, 31)?);
                Ok(random_walk(label, start, end)?)
            }
            (None, None) => bail!("one of --prices or --synthetic is required"),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sweep {
            source,
            config,
            strategy,
            short,
            long,
            rsi_thresholds,
            fees,
            ranking,
            risk_free_rate,
            intraday,
            sequential,
            time_budget,
            top,
            predictions,
            output_dir,
        } => {
            let mut cfg = match config {
                Some(path) => SweepConfig::from_file(&path)?,
                None => SweepConfig::default(),
            };
            if let Some(s) = strategy {
                cfg.strategy = parse_family(&s)?;
            }
            if let Some(v) = short {
                cfg.short_windows = v;
            }
            if let Some(v) = long {
                cfg.long_windows = v;
            }
            if let Some(v) = rsi_thresholds {
                cfg.rsi_thresholds = v;
            }
            if let Some(v) = fees {
                cfg.fee_rates = v;
            }
            if let Some(v) = ranking {
                cfg.ranking = v;
            }
            if let Some(v) = risk_free_rate {
                cfg.risk_free_rate = v;
            }
            if intraday {
                cfg.return_mode = ReturnMode::Intraday;
            }
            if sequential {
                cfg.parallel = false;
            }
            if time_budget.is_some() {
                cfg.time_budget_secs = time_budget;
            }
            if let Some(v) = top {
                cfg.top_n = v;
            }
            cfg.validate()?;
            run_sweep_cmd(&source, &cfg, predictions.as_deref(), &output_dir)
        }
        Commands::Run {
            source,
            strategy,
            short,
            long,
            rsi_threshold,
            rsi_period,
            fee,
            risk_free_rate,
            intraday,
            predictions,
            trace,
        } => {
            let kind = match parse_family(&strategy)? {
                StrategyFamily::MaCrossover => StrategyKind::MaCrossover {
                    short_window: short,
                    long_window: long,
                },
                StrategyFamily::MaRsi => StrategyKind::MaRsi {
                    short_window: short,
                    long_window: long,
                    rsi_period,
                    rsi_threshold,
                },
                StrategyFamily::Classifier => StrategyKind::Classifier,
            };
            let mode = if intraday {
                ReturnMode::Intraday
            } else {
                ReturnMode::CloseToClose
            };
            let params = StrategyParams::new(kind, fee, mode)?;
            run_single_cmd(
                &source,
                &params,
                risk_free_rate,
                predictions.as_deref(),
                trace.as_deref(),
            )
        }
        Commands::Synthetic {
            label,
            start,
            end,
            output,
        } => run_synthetic_cmd(&label, start, end, &output),
    }
}

fn run_sweep_cmd(
    source: &PriceSource,
    cfg: &SweepConfig,
    predictions: Option<&Path>,
    output_dir: &Path,
) -> Result<()> {
    let prices = source.load()?;
    let stream = load_stream(predictions, &prices)?;
    let classifier = stream.as_ref().map(|s| s as &dyn Classifier);

    let results = cfg
        .sweep()
        .sweep_with_progress(&prices, &cfg.grid(), classifier, |idx, total, r| {
            tracing::debug!(idx, total, params = %r.params.label(), "combination done");
        })
        .context("sweep failed")?;

    let benchmark = buy_and_hold_return(&prices);
    print_leaderboard(&results, benchmark, cfg.top_n);

    let written = save_artifacts(&results, &prices, benchmark, cfg.top_n, output_dir)?;
    println!("Artifacts saved to: {}", output_dir.display());
    for path in written {
        println!("  {}", path.display());
    }
    Ok(())
}

fn run_single_cmd(
    source: &PriceSource,
    params: &StrategyParams,
    risk_free_rate: f64,
    predictions: Option<&Path>,
    trace_path: Option<&Path>,
) -> Result<()> {
    let prices = source.load()?;
    let stream = load_stream(predictions, &prices)?;
    let classifier = stream.as_ref().map(|s| s as &dyn Classifier);

    let trace = run_backtest_traced(&prices, params, annual_to_daily(risk_free_rate), classifier)?;
    print_summary(&trace.result, buy_and_hold_return(&prices));

    if let Some(path) = trace_path {
        let csv = export_trace_csv(&prices, &trace)?;
        std::fs::write(path, csv)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Trace saved to: {}", path.display());
    }
    Ok(())
}

fn run_synthetic_cmd(label: &str, start: NaiveDate, end: NaiveDate, output: &Path) -> Result<()> {
    let prices = random_walk(label, start, end)?;
    let file = std::fs::File::create(output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    write_prices(file, &prices)?;
    println!(
        "Wrote {} bars ({} to {}) to {}",
        prices.len(),
        start,
        end,
        output.display()
    );
    Ok(())
}

fn load_stream(path: Option<&Path>, prices: &PriceSeries) -> Result<Option<PredictionStream>> {
    path.map(|p| load_predictions(p, prices))
        .transpose()
        .context("failed to load predictions")
}

fn parse_family(name: &str) -> Result<StrategyFamily> {
    Ok(match name {
        "ma_crossover" | "ma" => StrategyFamily::MaCrossover,
        "ma_rsi" => StrategyFamily::MaRsi,
        "classifier" => StrategyFamily::Classifier,
        _ => bail!("unknown strategy '{name}'. Valid: ma_crossover, ma_rsi, classifier"),
    })
}

fn date(y: i32, m: u32, d: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d).with_context(|| format!("invalid date {y}-{m}-{d}"))
}

fn print_leaderboard(results: &SweepResults, benchmark: f64, top: usize) {
    println!();
    println!(
        "=== Sweep: {} of {} combinations, ranked by {} ===",
        results.len(),
        results.total(),
        results.metric()
    );
    if results.is_partial() {
        println!("WARNING: deadline reached, results are partial");
    }
    println!();
    println!(
        "{:>3}  {:<22} {:>10} {:>10} {:>9} {:>8} {:>7}",
        "#", "Params", "Net", "Gross", "Fees", "Sharpe", "Trades"
    );
    println!("{}", "-".repeat(76));
    for (i, r) in results.top_n(top).iter().enumerate() {
        println!(
            "{:>3}  {:<22} {:>9.2}% {:>9.2}% {:>8.2}% {:>8.3} {:>7}",
            i + 1,
            r.params.label(),
            r.net_return * 100.0,
            r.gross_return * 100.0,
            r.fee_drag * 100.0,
            r.sharpe_ratio,
            r.trade_count
        );
    }
    println!();
    println!("Buy & Hold:     {:.2}%", benchmark * 100.0);
    if let Some(m) = results.most_traded() {
        println!(
            "Most traded:    {} ({} trades, {:.2}% lost to fees)",
            m.params.label(),
            m.trade_count,
            m.fee_drag * 100.0
        );
    }
    println!();
}

fn print_summary(result: &BacktestResult, benchmark: f64) {
    println!();
    println!("=== Backtest Result ===");
    println!("Params:         {}", result.params.label());
    println!("Run id:         {}", result.run_id);
    println!("Bars:           {}", result.bar_count);
    println!("Trades:         {}", result.trade_count);
    println!();
    println!("--- Performance ---");
    println!("Net Return:     {:.2}%", result.net_return * 100.0);
    println!("Gross Return:   {:.2}%", result.gross_return * 100.0);
    println!("Fee Drag:       {:.2}%", result.fee_drag * 100.0);
    println!("Sharpe:         {:.3}", result.sharpe_ratio);
    println!("Max Drawdown:   {:.2}%", result.max_drawdown * 100.0);
    println!("Exposure:       {:.1}%", result.exposure * 100.0);
    println!("Buy & Hold:     {:.2}%", benchmark * 100.0);
    println!();
}
