//! Simulated orders: side, identity, price levels and outcome.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// +1 for Buy, -1 for Sell.
    pub fn sign(self) -> f64 {
        match self {
            Side::Buy => 1.0,
            Side::Sell => -1.0,
        }
    }

    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "Buy"),
            Side::Sell => write!(f, "Sell"),
        }
    }
}

/// Sequence ID assigned by the engine at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Why an order was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloseReason {
    /// Exit at the take-profit level.
    TakeProfit,
    /// Exit at the stop-loss level.
    StopLoss,
    /// Manual, bulk or time-based exit at the current bar close.
    Close,
    /// Unclassified exit at the current bar close.
    None,
}

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Open,
    TakeProfit,
    StopLoss,
    Close,
    None,
}

impl From<CloseReason> for OrderStatus {
    fn from(reason: CloseReason) -> Self {
        match reason {
            CloseReason::TakeProfit => OrderStatus::TakeProfit,
            CloseReason::StopLoss => OrderStatus::StopLoss,
            CloseReason::Close => OrderStatus::Close,
            CloseReason::None => OrderStatus::None,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::Open => "open",
            OrderStatus::TakeProfit => "TP",
            OrderStatus::StopLoss => "SL",
            OrderStatus::Close => "close",
            OrderStatus::None => "none",
        };
        f.write_str(s)
    }
}

/// A single simulated position.
///
/// While `closed` is false the order lives in the engine's open set and its
/// exit fields track the latest tick. Once closed it is moved to the closed
/// set and never mutated again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Caller-supplied tag, e.g. a strategy leg identifier like `"Buy-3"`.
    pub label: String,
    pub side: Side,
    pub symbol: String,
    pub volume: f64,
    pub entry_time: NaiveDateTime,
    pub entry_price: f64,
    pub take_profit: f64,
    /// `None` when the engine runs with stop-losses disabled.
    pub stop_loss: Option<f64>,
    pub exit_time: NaiveDateTime,
    pub exit_price: f64,
    /// Signed profit in account currency; unrealised while open.
    pub profit: f64,
    pub status: OrderStatus,
    pub closed: bool,
}

impl Order {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: OrderId,
        label: String,
        side: Side,
        symbol: String,
        volume: f64,
        entry_time: NaiveDateTime,
        entry_price: f64,
        take_profit: f64,
        stop_loss: Option<f64>,
        exit_price: f64,
    ) -> Self {
        Self {
            id,
            label,
            side,
            symbol,
            volume,
            entry_time,
            entry_price,
            take_profit,
            stop_loss,
            exit_time: entry_time,
            exit_price,
            profit: 0.0,
            status: OrderStatus::Open,
            closed: false,
        }
    }

    pub fn is_open(&self) -> bool {
        !self.closed
    }

    /// Numeric step parsed from a `"<Side>-<n>"` label, if the label has that shape.
    pub fn label_step(&self) -> Option<i64> {
        let (_, step) = self.label.rsplit_once('-')?;
        step.trim().parse().ok()
    }
}
