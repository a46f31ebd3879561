//! CSV bar loading for the runner.
//!
//! One file per symbol, `<dir>/<SYMBOL>.csv`, with a header row naming at
//! least `date,open,high,low,close`. Extra columns are ignored. Rows must
//! already be in ascending time order; the store rejects anything else.

use backsim_core::{PriceBar, PriceSeries, PriceSeriesStore, SeriesError};
use chrono::NaiveDateTime;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open data file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("malformed row {row} in {path}: {source}")]
    Row {
        path: PathBuf,
        row: usize,
        #[source]
        source: csv::Error,
    },

    #[error("bad timestamp '{value}' at row {row} in {path} (expected format '{format}')")]
    Timestamp {
        path: PathBuf,
        row: usize,
        value: String,
        format: String,
    },

    #[error("invalid series: {0}")]
    Series(#[from] SeriesError),
}

#[derive(Debug, Deserialize)]
struct RawRow {
    date: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
}

/// Loaded price data plus provenance.
#[derive(Debug)]
pub struct LoadedData {
    pub store: PriceSeriesStore,
    /// BLAKE3 over all bar data, for fingerprinting.
    pub dataset_hash: String,
    pub bar_counts: BTreeMap<String, usize>,
}

pub fn data_path(dir: &Path, symbol: &str) -> PathBuf {
    dir.join(format!("{symbol}.csv"))
}

/// Read one symbol's CSV file into a validated series.
pub fn load_series(path: &Path, symbol: &str, date_format: &str) -> Result<PriceSeries, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    let mut bars = Vec::new();
    let mut insane = 0usize;
    for (i, record) in reader.deserialize::<RawRow>().enumerate() {
        // Row numbers are 1-based and count the header.
        let row = i + 2;
        let raw = record.map_err(|source| LoadError::Row {
            path: path.to_path_buf(),
            row,
            source,
        })?;
        let timestamp = NaiveDateTime::parse_from_str(&raw.date, date_format).map_err(|_| {
            LoadError::Timestamp {
                path: path.to_path_buf(),
                row,
                value: raw.date.clone(),
                format: date_format.to_string(),
            }
        })?;
        let bar = PriceBar::new(timestamp, raw.open, raw.high, raw.low, raw.close);
        if !bar.is_sane() {
            insane += 1;
        }
        bars.push(bar);
    }

    if insane > 0 {
        warn!(symbol, count = insane, "bars with inconsistent OHLC ranges");
    }
    debug!(symbol, bars = bars.len(), path = %path.display(), "loaded series");
    Ok(PriceSeries::new(symbol, bars)?)
}

/// Load every symbol from `dir` into a store.
pub fn load_store(dir: &Path, symbols: &[&str], date_format: &str) -> Result<LoadedData, LoadError> {
    let mut store = PriceSeriesStore::new();
    let mut bar_counts = BTreeMap::new();
    for symbol in symbols {
        let series = load_series(&data_path(dir, symbol), symbol, date_format)?;
        bar_counts.insert(symbol.to_string(), series.len());
        store.insert(series);
    }
    let dataset_hash = compute_dataset_hash(&store);
    Ok(LoadedData {
        store,
        dataset_hash,
        bar_counts,
    })
}

/// Deterministic BLAKE3 hash over every bar, in symbol order.
pub fn compute_dataset_hash(store: &PriceSeriesStore) -> String {
    let mut hasher = blake3::Hasher::new();
    for symbol in store.symbols() {
        hasher.update(symbol.as_bytes());
        if let Ok(bars) = store.bars(symbol) {
            for bar in bars {
                hasher.update(&bar.timestamp.and_utc().timestamp().to_le_bytes());
                hasher.update(&bar.open.to_le_bytes());
                hasher.update(&bar.high.to_le_bytes());
                hasher.update(&bar.low.to_le_bytes());
                hasher.update(&bar.close.to_le_bytes());
            }
        }
    }
    hasher.finalize().to_hex().to_string()
}
