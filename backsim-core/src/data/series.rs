//! Price series store with nearest-time lookup.
//!
//! Simulated time may fall between bars (weekends, session gaps). Lookups
//! resolve a time to a bar with this policy:
//! 1. exact timestamp match → that bar
//! 2. otherwise the latest bar at or before the time (forward fill)
//! 3. if the time precedes all data, the earliest bar (backward fill)
//!
//! Because series are validated non-empty at construction, lookups on a
//! loaded symbol always resolve to a bar.

use crate::domain::PriceBar;
use crate::error::{EngineError, SeriesError};
use chrono::NaiveDateTime;
use std::collections::BTreeMap;

/// Time-ordered bars for one symbol. Strictly ascending, non-empty.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Validate and wrap a bar sequence.
    pub fn new(symbol: impl Into<String>, bars: Vec<PriceBar>) -> Result<Self, SeriesError> {
        let symbol = symbol.into();
        if bars.is_empty() {
            return Err(SeriesError::Empty { symbol });
        }
        for (index, pair) in bars.windows(2).enumerate() {
            let (previous, current) = (pair[0].timestamp, pair[1].timestamp);
            if current == previous {
                return Err(SeriesError::DuplicateTimestamp {
                    symbol,
                    index: index + 1,
                    timestamp: current,
                });
            }
            if current < previous {
                return Err(SeriesError::OutOfOrder {
                    symbol,
                    index: index + 1,
                    timestamp: current,
                    previous,
                });
            }
        }
        Ok(Self { symbol, bars })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first_time(&self) -> NaiveDateTime {
        self.bars[0].timestamp
    }

    pub fn last_time(&self) -> NaiveDateTime {
        self.bars[self.bars.len() - 1].timestamp
    }

    /// True if a bar exists at exactly this timestamp.
    pub fn contains(&self, time: NaiveDateTime) -> bool {
        self.bars
            .binary_search_by_key(&time, |bar| bar.timestamp)
            .is_ok()
    }

    fn nearest_index(&self, time: NaiveDateTime) -> usize {
        match self.bars.binary_search_by_key(&time, |bar| bar.timestamp) {
            Ok(exact) => exact,
            // Precedes all data: backward fill to the first bar.
            Err(0) => 0,
            // Forward fill: the last bar before the insertion point.
            Err(insert_at) => insert_at - 1,
        }
    }

    /// Resolve `time` to the timestamp of the bar used for pricing.
    pub fn nearest_time(&self, time: NaiveDateTime) -> NaiveDateTime {
        self.bars[self.nearest_index(time)].timestamp
    }

    /// The bar at the nearest valid time.
    pub fn price_at(&self, time: NaiveDateTime) -> &PriceBar {
        &self.bars[self.nearest_index(time)]
    }
}

/// Per-symbol price series, read-only once a simulation starts.
#[derive(Debug, Clone, Default)]
pub struct PriceSeriesStore {
    series: BTreeMap<String, PriceSeries>,
}

impl PriceSeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_series(series: impl IntoIterator<Item = PriceSeries>) -> Self {
        let mut store = Self::new();
        for s in series {
            store.insert(s);
        }
        store
    }

    /// Add or replace the series for its symbol.
    pub fn insert(&mut self, series: PriceSeries) {
        self.series.insert(series.symbol.clone(), series);
    }

    pub fn series(&self, symbol: &str) -> Result<&PriceSeries, EngineError> {
        self.series
            .get(symbol)
            .ok_or_else(|| EngineError::SymbolNotFound(symbol.to_string()))
    }

    pub fn bars(&self, symbol: &str) -> Result<&[PriceBar], EngineError> {
        Ok(self.series(symbol)?.bars())
    }

    pub fn nearest_time(
        &self,
        symbol: &str,
        time: NaiveDateTime,
    ) -> Result<NaiveDateTime, EngineError> {
        Ok(self.series(symbol)?.nearest_time(time))
    }

    pub fn price_at(&self, symbol: &str, time: NaiveDateTime) -> Result<&PriceBar, EngineError> {
        Ok(self.series(symbol)?.price_at(time))
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }
}
