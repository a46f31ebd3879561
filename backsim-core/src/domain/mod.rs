//! Domain types for BackSim

pub mod bar;
pub mod order;
pub mod symbol;

pub use bar::PriceBar;
pub use order::{CloseReason, Order, OrderId, OrderStatus, Side};
pub use symbol::{SymbolMetadata, SymbolRegistry, SymbolSpec};
