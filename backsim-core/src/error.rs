//! Error taxonomy for the engine and its lookup services.

use crate::domain::OrderId;
use chrono::NaiveDateTime;
use thiserror::Error;

/// Errors raised by the engine, the symbol registry and the price series store.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// No metadata or no price series registered for the symbol.
    #[error("symbol '{0}' not found")]
    SymbolNotFound(String),

    /// The order is not in the open set (already closed, or foreign to this engine).
    #[error("order {0} not found in the open orders")]
    OrderNotFound(OrderId),

    #[error("invalid volume {volume} for {symbol}: must be positive and finite")]
    InvalidVolume { symbol: String, volume: f64 },

    #[error("invalid engine options: {0}")]
    InvalidOptions(String),
}

/// Load-time validation failures for a price series.
///
/// An empty or unordered series is a configuration error; it is rejected
/// when the series is built so that lookups during ticking never fail.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("price series for '{symbol}' is empty")]
    Empty { symbol: String },

    #[error("price series for '{symbol}' is out of order at index {index}: {timestamp} precedes {previous}")]
    OutOfOrder {
        symbol: String,
        index: usize,
        timestamp: NaiveDateTime,
        previous: NaiveDateTime,
    },

    #[error("price series for '{symbol}' has duplicate timestamp {timestamp} at index {index}")]
    DuplicateTimestamp {
        symbol: String,
        index: usize,
        timestamp: NaiveDateTime,
    },
}
