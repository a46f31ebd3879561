//! State reporter: read-only snapshots of an engine for external consumers.

use crate::domain::{Order, OrderId, OrderStatus, Side};
use crate::engine::Engine;
use crate::error::EngineError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Decimal places kept in the displayed per-order profit.
pub const PROFIT_DISPLAY_DECIMALS: i32 = 5;

/// One order as it appears in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: OrderId,
    pub label: String,
    pub symbol: String,
    pub side: Side,
    pub volume: f64,
    pub entry_time: NaiveDateTime,
    pub entry_price: f64,
    pub stop_loss: Option<f64>,
    pub take_profit: f64,
    pub exit_time: NaiveDateTime,
    pub exit_price: f64,
    /// Profit rounded for display.
    pub profit: f64,
    pub status: OrderStatus,
    pub closed: bool,
    /// Range of the bar the order entered on.
    pub entry_bar_high: f64,
    pub entry_bar_low: f64,
    /// Range of the bar at the order's latest exit time.
    pub exit_bar_high: f64,
    pub exit_bar_low: f64,
}

/// Engine state at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub current_time: NaiveDateTime,
    pub balance: f64,
    pub equity: f64,
    /// Closed orders first, then open ones, each in creation order.
    pub orders: Vec<OrderRecord>,
    /// Running sum of per-order profit in `orders` order.
    pub equity_graph: Vec<f64>,
}

impl Snapshot {
    pub fn capture(engine: &Engine) -> Result<Self, EngineError> {
        let all = engine
            .closed_orders()
            .iter()
            .chain(engine.open_orders().iter());

        let mut orders = Vec::new();
        let mut equity_graph = Vec::new();
        let mut running = 0.0;
        for order in all {
            orders.push(record(engine, order)?);
            running += order.profit;
            equity_graph.push(running);
        }

        Ok(Self {
            current_time: engine.current_time(),
            balance: engine.balance(),
            equity: engine.equity(),
            orders,
            equity_graph,
        })
    }

    pub fn open_count(&self) -> usize {
        self.orders.iter().filter(|o| !o.closed).count()
    }

    pub fn closed_count(&self) -> usize {
        self.orders.iter().filter(|o| o.closed).count()
    }
}

fn record(engine: &Engine, order: &Order) -> Result<OrderRecord, EngineError> {
    let series = engine.series(&order.symbol)?;
    let entry_bar = series.price_at(order.entry_time);
    let exit_bar = series.price_at(order.exit_time);
    Ok(OrderRecord {
        id: order.id,
        label: order.label.clone(),
        symbol: order.symbol.clone(),
        side: order.side,
        volume: order.volume,
        entry_time: order.entry_time,
        entry_price: order.entry_price,
        stop_loss: order.stop_loss,
        take_profit: order.take_profit,
        exit_time: order.exit_time,
        exit_price: order.exit_price,
        profit: round_profit(order.profit),
        status: order.status,
        closed: order.closed,
        entry_bar_high: entry_bar.high,
        entry_bar_low: entry_bar.low,
        exit_bar_high: exit_bar.high,
        exit_bar_low: exit_bar.low,
    })
}

pub fn round_profit(profit: f64) -> f64 {
    let factor = 10f64.powi(PROFIT_DISPLAY_DECIMALS);
    (profit * factor).round() / factor
}
