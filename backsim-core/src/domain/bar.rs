//! PriceBar: one OHLC record of a symbol's price series.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// OHLC bar at a single timestamp.
///
/// Bars carry no symbol; they always live inside a [`PriceSeries`](crate::data::PriceSeries)
/// that owns the symbol name.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl PriceBar {
    pub fn new(timestamp: NaiveDateTime, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
        }
    }

    /// Basic OHLC sanity: high is the top of the range, low the bottom.
    pub fn is_sane(&self) -> bool {
        let finite = self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite();
        finite
            && self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
    }
}
