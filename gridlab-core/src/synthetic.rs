//! Deterministic synthetic price history for demos, tests and benchmarks.
//!
//! A uniform random walk from 100.0, moving at most 3% per day, on weekdays
//! only. The seed is derived from a caller-supplied label via BLAKE3, so the
//! same label always yields the same series.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::{PriceBar, PriceSeries};
use crate::error::{EngineError, Result};

/// Starting price of every synthetic walk.
pub const START_PRICE: f64 = 100.0;

/// Largest absolute daily move.
pub const MAX_DAILY_MOVE: f64 = 0.03;

/// Generate weekday bars from `start` to `end` inclusive.
pub fn random_walk(label: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceSeries> {
    if end < start {
        return Err(EngineError::invalid(
            "end",
            format!("end date {end} precedes start date {start}"),
        ));
    }
    let seed: [u8; 32] = *blake3::hash(label.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut bars = Vec::new();
    let mut price = START_PRICE;
    let mut current = start;

    while current <= end {
        if matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            current += Duration::days(1);
            continue;
        }

        let daily_return: f64 = rng.gen_range(-MAX_DAILY_MOVE..MAX_DAILY_MOVE);
        let open = price;
        let close = price * (1.0 + daily_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(500_000..5_000_000u64);

        bars.push(PriceBar::ohlcv(current, open, high, low, close, volume));
        price = close;
        current += Duration::days(1);
    }

    PriceSeries::new(bars)
}

/// `n` weekday bars starting at `start`.
pub fn random_walk_bars(label: &str, start: NaiveDate, n: usize) -> Result<PriceSeries> {
    // Five weekdays per seven calendar days, plus slack for a weekend start.
    let span = (n as i64 * 7) / 5 + 7;
    let series = random_walk(label, start, start + Duration::days(span))?;
    PriceSeries::new(series.bars().iter().take(n).cloned().collect())
}
