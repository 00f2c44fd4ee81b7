//! Immutable, date-aligned series.
//!
//! Data flows PriceSeries → IndicatorSeries → PositionSeries →
//! ExecutedPositionSeries → ReturnSeries. Each stage is a new value; nothing
//! downstream ever writes back into an upstream series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::bar::PriceBar;
use crate::error::{EngineError, Result};

/// Validated, date-ordered price history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Build a series, rejecting anything that would corrupt causality.
    ///
    /// Dates must be strictly increasing (no duplicates) and every bar must
    /// carry a positive finite close. An empty series is valid.
    pub fn new(bars: Vec<PriceBar>) -> Result<Self> {
        for (i, bar) in bars.iter().enumerate() {
            bar.validate(i)?;
            if i > 0 && bar.date <= bars[i - 1].date {
                return Err(EngineError::malformed(
                    i,
                    format!(
                        "dates must be strictly increasing ({} follows {})",
                        bar.date,
                        bars[i - 1].date
                    ),
                ));
            }
        }
        Ok(Self { bars })
    }

    /// Close-only series on consecutive calendar days starting at `start`.
    pub fn from_closes(start: NaiveDate, closes: &[f64]) -> Result<Self> {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar::new(start + chrono::Duration::days(i as i64), close))
            .collect();
        Self::new(bars)
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.bars.iter().map(|b| b.date)
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    /// Fail unless every bar carries an open price.
    pub fn require_open(&self) -> Result<()> {
        match self.bars.iter().position(|b| b.open.is_none()) {
            Some(i) => Err(EngineError::malformed(
                i,
                "open price required for intraday returns",
            )),
            None => Ok(()),
        }
    }

    /// Index of the bar dated `date`, if present.
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.bars.binary_search_by_key(&date, |b| b.date).ok()
    }
}

/// A value per price date; `None` marks dates without enough history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSeries {
    name: String,
    values: Vec<Option<f64>>,
}

impl IndicatorSeries {
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// All-missing series of length `len`.
    pub fn missing(name: impl Into<String>, len: usize) -> Self {
        Self::new(name, vec![None; len])
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    /// Value at `index`; `None` if missing or out of range.
    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Index of the first defined value.
    pub fn first_defined(&self) -> Option<usize> {
        self.values.iter().position(|v| v.is_some())
    }

    pub fn is_all_missing(&self) -> bool {
        self.first_defined().is_none()
    }
}

/// Binary position intent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    #[default]
    Flat,
    Hold,
}

impl Position {
    /// Numeric exposure: 0.0 or 1.0.
    pub fn exposure(self) -> f64 {
        match self {
            Self::Flat => 0.0,
            Self::Hold => 1.0,
        }
    }

    pub fn from_bool(hold: bool) -> Self {
        if hold {
            Self::Hold
        } else {
            Self::Flat
        }
    }

    /// Parse a 0/1 label.
    pub fn from_label(label: i64) -> Option<Self> {
        match label {
            0 => Some(Self::Flat),
            1 => Some(Self::Hold),
            _ => None,
        }
    }

    pub fn is_hold(self) -> bool {
        matches!(self, Self::Hold)
    }
}

/// Position intent per date, before the execution lag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionSeries {
    values: Vec<Position>,
}

impl PositionSeries {
    pub fn new(values: Vec<Position>) -> Self {
        Self { values }
    }

    pub fn flat(len: usize) -> Self {
        Self::new(vec![Position::Flat; len])
    }

    pub fn values(&self) -> &[Position] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<Position> {
        self.values.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<Position> for PositionSeries {
    fn from_iter<I: IntoIterator<Item = Position>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Position actually held on each date: the intent of the previous date.
///
/// The first entry is always `None` since no prior-day decision exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutedPositionSeries {
    values: Vec<Option<Position>>,
}

impl ExecutedPositionSeries {
    pub(crate) fn new(values: Vec<Option<Position>>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[Option<Position>] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<Position> {
        self.values.get(index).copied().flatten()
    }

    /// Position used for return purposes; missing counts as flat.
    pub fn effective(&self, index: usize) -> Position {
        self.get(index).unwrap_or(Position::Flat)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Gross and net strategy returns with the trade-action indicator.
///
/// `gross[t]` and `net[t]` are `None` exactly where the raw market return is
/// undefined (the first bar in close-to-close mode).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries {
    pub(crate) gross: Vec<Option<f64>>,
    pub(crate) net: Vec<Option<f64>>,
    pub(crate) trade_action: Vec<u8>,
    pub(crate) positions: Vec<Position>,
}

impl ReturnSeries {
    pub fn gross(&self) -> &[Option<f64>] {
        &self.gross
    }

    pub fn net(&self) -> &[Option<f64>] {
        &self.net
    }

    /// 1 on dates where the executed position changed, else 0.
    pub fn trade_action(&self) -> &[u8] {
        &self.trade_action
    }

    /// Effective executed position per date.
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.gross.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gross.is_empty()
    }

    pub fn trade_count(&self) -> usize {
        self.trade_action.iter().map(|&a| a as usize).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn accepts_empty_series() {
        let series = PriceSeries::new(vec![]).unwrap();
        assert!(series.is_empty());
        assert_eq!(series.first_date(), None);
    }

    #[test]
    fn rejects_unsorted_dates() {
        let bars = vec![PriceBar::new(d(3), 100.0), PriceBar::new(d(2), 101.0)];
        let err = PriceSeries::new(bars).unwrap_err();
        assert!(matches!(err, EngineError::MalformedInput { index: 1, .. }));
    }

    #[test]
    fn rejects_duplicate_dates() {
        let bars = vec![PriceBar::new(d(2), 100.0), PriceBar::new(d(2), 101.0)];
        assert!(PriceSeries::new(bars).is_err());
    }

    #[test]
    fn require_open_reports_first_gap() {
        let bars = vec![
            PriceBar::ohlcv(d(2), 99.0, 101.0, 98.0, 100.0, 10),
            PriceBar::new(d(3), 101.0),
        ];
        let series = PriceSeries::new(bars).unwrap();
        let err = series.require_open().unwrap_err();
        assert!(matches!(err, EngineError::MalformedInput { index: 1, .. }));
    }

    #[test]
    fn from_closes_lays_out_consecutive_days() {
        let series = PriceSeries::from_closes(d(2), &[100.0, 102.0, 101.0]).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.last_date(), Some(d(4)));
        assert_eq!(series.index_of(d(3)), Some(1));
        assert_eq!(series.index_of(d(9)), None);
    }

    #[test]
    fn indicator_get_treats_missing_and_out_of_range_alike() {
        let ind = IndicatorSeries::new("sma_2", vec![None, Some(101.0)]);
        assert_eq!(ind.get(0), None);
        assert_eq!(ind.get(1), Some(101.0));
        assert_eq!(ind.get(2), None);
        assert_eq!(ind.first_defined(), Some(1));
        assert!(IndicatorSeries::missing("x", 3).is_all_missing());
    }

    #[test]
    fn position_labels() {
        assert_eq!(Position::from_label(1), Some(Position::Hold));
        assert_eq!(Position::from_label(0), Some(Position::Flat));
        assert_eq!(Position::from_label(2), None);
        assert_eq!(Position::Hold.exposure(), 1.0);
    }

    #[test]
    fn executed_missing_counts_as_flat() {
        let executed = ExecutedPositionSeries::new(vec![None, Some(Position::Hold)]);
        assert_eq!(executed.get(0), None);
        assert_eq!(executed.effective(0), Position::Flat);
        assert_eq!(executed.effective(1), Position::Hold);
    }
}
