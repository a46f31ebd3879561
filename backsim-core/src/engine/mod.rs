//! Backtesting engine: simulation clock, order lifecycle and accounting.
//!
//! Callers create orders, call `tick` repeatedly and read state through the
//! reporter. Each tick marks every open order to the current bar, applies the
//! trailing stop, TP/SL triggers and the holding-time limit, then recomputes
//! equity from the balance and the remaining open orders.

pub mod accounting;
pub mod close;
pub mod options;
pub mod simulator;
pub mod state;
pub mod trigger;

pub use accounting::order_profit;
pub use close::{BulkClose, CloseFilter, CloseOutcome};
pub use options::{EngineOptions, DEFAULT_ACCOUNT_MULTIPLIER, DEFAULT_INITIAL_BALANCE};
pub use simulator::Engine;
pub use state::{BundleStatus, TickReport};
