//! Strategy components: indicators and signal rules.
//!
//! A backtest composes exactly two pluggable pieces:
//! - Indicators: precomputed, date-aligned numeric series
//! - Signal generator: reads indicators at one date, emits hold or flat
//!
//! Execution lag, returns and fees are fixed engine behavior, not components.

pub mod indicator;
pub mod signal;

pub use indicator::{Indicator, IndicatorSet};
pub use signal::{
    build_signal, classify, generate_signal, Classifier, ClassifierSignal, MaCrossover,
    MaRsiFilter, PredictionStream, SignalGenerator,
};
