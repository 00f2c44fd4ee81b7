//! Execution lag: a decision made on date t takes effect on date t+1.

use crate::domain::{ExecutedPositionSeries, PositionSeries};

/// Shift `intent` forward by one period.
///
/// `executed[t] == intent[t-1]`; the first entry is missing because no
/// prior-day decision exists. This is the only place a position crosses a
/// date boundary.
pub fn apply_lag(intent: &PositionSeries) -> ExecutedPositionSeries {
    let values = intent.values();
    let executed = (0..values.len())
        .map(|t| t.checked_sub(1).map(|prev| values[prev]))
        .collect();
    ExecutedPositionSeries::new(executed)
}
