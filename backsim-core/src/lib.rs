//! BackSim Core: discrete-time backtesting engine.
//!
//! This crate contains the heart of the simulator:
//! - Domain types (price bars, symbol metadata, orders)
//! - Symbol metadata registry and price series store with nearest-time lookup
//! - Tick-driven engine: clock stepping with gap skip, trailing stops,
//!   TP/SL triggers, time-based close, profit and equity accounting
//! - Manual and bulk closing with explicit outcomes
//! - State reporter producing serialisable snapshots
//!
//! The engine is single-threaded and deterministic: identical bars, orders
//! and tick sequences reproduce identical results. The registry and store
//! are immutable and may be shared between engines via `Arc`.

pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod report;

pub use data::{PriceSeries, PriceSeriesStore};
pub use domain::{
    CloseReason, Order, OrderId, OrderStatus, PriceBar, Side, SymbolMetadata, SymbolRegistry,
    SymbolSpec,
};
pub use engine::{
    BulkClose, BundleStatus, CloseFilter, CloseOutcome, Engine, EngineOptions, TickReport,
};
pub use error::{EngineError, SeriesError};
pub use report::{OrderRecord, Snapshot};
