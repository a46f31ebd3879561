//! Per-tick results and open-bundle summaries.

use crate::domain::OrderId;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// What a single `tick` did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    /// Simulated time after the step (and any gap skipping).
    pub time: NaiveDateTime,
    /// Extra `delta` increments taken to jump over a data gap.
    pub skipped_steps: usize,
    /// Orders closed during this tick, in evaluation order.
    pub closed: Vec<OrderId>,
    pub balance: f64,
    pub equity: f64,
}

/// Summary of the open orders sharing a symbol and side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BundleStatus {
    pub count: usize,
    /// Summed unrealised profit of the bundle.
    pub profit: f64,
    pub last_entry_time: Option<NaiveDateTime>,
    pub last_entry_price: Option<f64>,
    pub last_label: Option<String>,
    /// Step number from a `"<Side>-<n>"` label on the latest entry.
    pub last_step: Option<i64>,
}
