//! Price and prediction loading for the runner.
//!
//! Reads header-driven CSV files into validated core series. The loader only
//! parses and reports; ordering, duplicate and positivity checks all come
//! from `PriceSeries::new`, so a file is accepted exactly when the engine
//! would accept the same bars built in memory.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use gridlab_core::components::signal::PredictionStream;
use gridlab_core::domain::{PriceBar, PriceSeries};
use gridlab_core::EngineError;
use thiserror::Error;
use tracing::{debug, info};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot open '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("row {row}: cannot parse {field} '{value}'")]
    BadField {
        row: usize,
        field: &'static str,
        value: String,
    },

    #[error("row {row}: {field} is empty")]
    EmptyField { row: usize, field: &'static str },

    #[error("invalid data: {0}")]
    Engine(#[from] EngineError),
}

/// Options controlling how price rows are read.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Prefer an `adj_close` column over `close` when both exist.
    pub adjusted: bool,
    /// Drop rows before this date.
    pub start: Option<NaiveDate>,
    /// Drop rows after this date.
    pub end: Option<NaiveDate>,
}

/// A loaded price series with its provenance.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub series: PriceSeries,
    /// BLAKE3 over every bar, for tying results to their input.
    pub dataset_hash: String,
    pub source: PathBuf,
}

/// Load prices from a CSV file.
pub fn load_prices(path: &Path, opts: &LoadOptions) -> Result<LoadedData, LoadError> {
    let file = open(path)?;
    let series = read_prices(file, opts)?;
    let dataset_hash = dataset_hash(&series);
    info!(
        path = %path.display(),
        bars = series.len(),
        first = ?series.first_date(),
        last = ?series.last_date(),
        "prices loaded"
    );
    Ok(LoadedData {
        series,
        dataset_hash,
        source: path.to_path_buf(),
    })
}

/// Parse price rows from any reader.
///
/// Columns are matched by header name, case-insensitively:
/// `date` and `close` (or `adj_close`) are required; `open`, `high`, `low`
/// and `volume` are optional and may be empty per row.
pub fn read_prices<R: Read>(reader: R, opts: &LoadOptions) -> Result<PriceSeries, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();
    let col = |names: &[&str]| {
        headers.iter().position(|h| {
            let h = h.to_ascii_lowercase().replace(' ', "_");
            names.contains(&h.as_str())
        })
    };

    let date_idx = col(&["date"]).ok_or_else(|| LoadError::MissingColumn("date".into()))?;
    let close_idx = match (col(&["close"]), col(&["adj_close", "adjclose"])) {
        (Some(_), Some(adj)) if opts.adjusted => adj,
        (Some(close), _) => close,
        (None, Some(adj)) => adj,
        (None, None) => return Err(LoadError::MissingColumn("close".into())),
    };
    let open_idx = col(&["open"]);
    let high_idx = col(&["high"]);
    let low_idx = col(&["low"]);
    let volume_idx = col(&["volume"]);

    let mut bars = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        // Header is line 1.
        let row = i + 2;
        let field = |idx: usize| record.get(idx).unwrap_or("");

        let date = parse_date(row, field(date_idx))?;
        if opts.start.is_some_and(|s| date < s) || opts.end.is_some_and(|e| date > e) {
            continue;
        }
        let close = parse_f64(row, "close", field(close_idx))?
            .ok_or(LoadError::EmptyField { row, field: "close" })?;

        let optional = |idx: Option<usize>, name: &'static str| match idx {
            Some(idx) => parse_f64(row, name, field(idx)),
            None => Ok(None),
        };
        let volume = match volume_idx.map(field) {
            Some(v) if !v.is_empty() => Some(parse_volume(row, v)?),
            _ => None,
        };

        bars.push(PriceBar {
            date,
            open: optional(open_idx, "open")?,
            high: optional(high_idx, "high")?,
            low: optional(low_idx, "low")?,
            close,
            volume,
        });
    }
    debug!(rows = bars.len(), "price rows parsed");

    Ok(PriceSeries::new(bars)?)
}

/// Load `date,prediction` rows aligned 1:1 with `prices`.
pub fn load_predictions(path: &Path, prices: &PriceSeries) -> Result<PredictionStream, LoadError> {
    let stream = read_predictions(open(path)?, prices)?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "predictions".into());
    info!(path = %path.display(), rows = stream.len(), "predictions loaded");
    Ok(stream.with_name(name))
}

/// Parse prediction rows from any reader.
pub fn read_predictions<R: Read>(
    reader: R,
    prices: &PriceSeries,
) -> Result<PredictionStream, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();
    let col = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
    let date_idx = col("date").ok_or_else(|| LoadError::MissingColumn("date".into()))?;
    let pred_idx = col("prediction").ok_or_else(|| LoadError::MissingColumn("prediction".into()))?;

    let mut rows = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let row = i + 2;
        let date = parse_date(row, record.get(date_idx).unwrap_or(""))?;
        let raw = record.get(pred_idx).unwrap_or("");
        let label: i64 = raw.parse().map_err(|_| LoadError::BadField {
            row,
            field: "prediction",
            value: raw.to_string(),
        })?;
        rows.push((date, label));
    }

    Ok(PredictionStream::new(prices, &rows)?)
}

/// Write `prices` as CSV with the columns `read_prices` expects.
pub fn write_prices<W: Write>(writer: W, prices: &PriceSeries) -> Result<(), LoadError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["date", "open", "high", "low", "close", "volume"])?;
    let opt = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();
    for bar in prices.bars() {
        wtr.write_record([
            bar.date.format(DATE_FORMAT).to_string(),
            opt(bar.open),
            opt(bar.high),
            opt(bar.low),
            bar.close.to_string(),
            bar.volume.map(|v| v.to_string()).unwrap_or_default(),
        ])?;
    }
    wtr.flush().map_err(|source| LoadError::Io {
        path: PathBuf::from("<writer>"),
        source,
    })?;
    Ok(())
}

/// Compute a deterministic BLAKE3 hash over all bar data.
pub fn dataset_hash(prices: &PriceSeries) -> String {
    let mut hasher = blake3::Hasher::new();
    for bar in prices.bars() {
        hasher.update(bar.date.to_string().as_bytes());
        for v in [bar.open, bar.high, bar.low] {
            hasher.update(&v.unwrap_or(f64::NAN).to_le_bytes());
        }
        hasher.update(&bar.close.to_le_bytes());
        hasher.update(&bar.volume.unwrap_or(u64::MAX).to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

fn open(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_date(row: usize, value: &str) -> Result<NaiveDate, LoadError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        // Accept "YYYY-MM-DD HH:MM:SS" exports by reading the date prefix.
        .or_else(|e| value.get(..10).map_or(Err(e), |d| NaiveDate::parse_from_str(d, DATE_FORMAT)))
        .map_err(|_| LoadError::BadField {
            row,
            field: "date",
            value: value.to_string(),
        })
}

fn parse_f64(row: usize, field: &'static str, value: &str) -> Result<Option<f64>, LoadError> {
    if value.is_empty() {
        return Ok(None);
    }
    value.parse().map(Some).map_err(|_| LoadError::BadField {
        row,
        field,
        value: value.to_string(),
    })
}

fn parse_volume(row: usize, value: &str) -> Result<u64, LoadError> {
    // Some exports write volume as a float ("1234.0").
    value
        .parse::<u64>()
        .or_else(|_| match value.parse::<f64>() {
            Ok(v) if v >= 0.0 && v.fract() == 0.0 => Ok(v as u64),
            _ => Err(()),
        })
        .map_err(|_| LoadError::BadField {
            row,
            field: "volume",
            value: value.to_string(),
        })
}
