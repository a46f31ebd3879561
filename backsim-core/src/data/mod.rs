//! Market data access for the engine.

pub mod series;

pub use series::{PriceSeries, PriceSeriesStore};
