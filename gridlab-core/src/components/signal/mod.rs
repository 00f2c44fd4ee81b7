//! Signal generation: converts same-day indicator values into position intent.
//!
//! A signal rule is asked one question per date: hold or flat, given what is
//! known at that date. It never sees the executed position, returns, or any
//! later index, which is what keeps the intent series free of look-ahead.

pub mod classifier;
pub mod ma_crossover;
pub mod ma_rsi;

pub use classifier::{classify, Classifier, ClassifierSignal, PredictionStream};
pub use ma_crossover::MaCrossover;
pub use ma_rsi::MaRsiFilter;

use crate::components::indicator::IndicatorSet;
use crate::domain::{Position, PositionSeries, StrategyKind, StrategyParams};

/// Trait for signal generators.
///
/// # Architecture invariant
/// `intent` receives the precomputed indicators and a single date index. An
/// implementation must only read values at `index`; indicators themselves
/// only depend on prices at dates <= their own index.
pub trait SignalGenerator: Send + Sync {
    /// Human-readable name (e.g., "ma_crossover").
    fn name(&self) -> &str;

    /// Number of bars before this rule can hold.
    fn warmup_bars(&self) -> usize;

    /// Position intent at `index`. Missing inputs mean flat.
    fn intent(&self, indicators: &IndicatorSet, index: usize) -> Position;

    /// Intent for every date covered by `indicators`.
    fn generate(&self, indicators: &IndicatorSet) -> PositionSeries {
        (0..indicators.len())
            .map(|i| self.intent(indicators, i))
            .collect()
    }
}

/// Build the signal rule described by `kind`.
pub fn build_signal(kind: &StrategyKind) -> Box<dyn SignalGenerator> {
    match *kind {
        StrategyKind::MaCrossover {
            short_window,
            long_window,
        } => Box::new(MaCrossover::new(short_window, long_window)),
        StrategyKind::MaRsi {
            short_window,
            long_window,
            rsi_period,
            rsi_threshold,
        } => Box::new(MaRsiFilter::new(
            short_window,
            long_window,
            rsi_period,
            rsi_threshold,
        )),
        StrategyKind::Classifier => Box::new(ClassifierSignal),
    }
}

/// Convert indicators into position intent using the rule in `params`.
pub fn generate_signal(indicators: &IndicatorSet, params: &StrategyParams) -> PositionSeries {
    build_signal(params.kind()).generate(indicators)
}
