//! Domain types for GridLab

pub mod bar;
pub mod params;
pub mod series;

pub use bar::PriceBar;
pub use params::{ReturnMode, StrategyKind, StrategyParams, DEFAULT_RSI_PERIOD};
pub use series::{
    ExecutedPositionSeries, IndicatorSeries, Position, PositionSeries, PriceSeries, ReturnSeries,
};
