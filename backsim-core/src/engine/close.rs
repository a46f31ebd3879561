//! Manual and bulk order closing.
//!
//! `try_close` reports an explicit [`CloseOutcome`] so bulk operations can
//! aggregate results; `close_order` is the strict variant that turns a
//! missing order into `OrderNotFound`.

use crate::domain::{CloseReason, OrderId, Side};
use crate::engine::accounting;
use crate::engine::simulator::Engine;
use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Result of a single close attempt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CloseOutcome {
    Closed { id: OrderId, profit: f64 },
    /// The order exists but has already been closed.
    AlreadyClosed(OrderId),
    /// The order was never created by this engine (or was dropped by a reset).
    NotFound(OrderId),
}

impl CloseOutcome {
    pub fn is_closed(&self) -> bool {
        matches!(self, CloseOutcome::Closed { .. })
    }
}

/// Which open orders a bulk close applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloseFilter {
    All,
    BuySide,
    SellSide,
}

impl CloseFilter {
    pub fn matches(self, side: Side) -> bool {
        match self {
            CloseFilter::All => true,
            CloseFilter::BuySide => side == Side::Buy,
            CloseFilter::SellSide => side == Side::Sell,
        }
    }
}

/// Aggregated outcomes of a bulk close.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkClose {
    pub outcomes: Vec<CloseOutcome>,
}

impl BulkClose {
    pub fn closed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_closed()).count()
    }

    /// Total profit realised by the batch.
    pub fn realized(&self) -> f64 {
        self.outcomes
            .iter()
            .map(|o| match o {
                CloseOutcome::Closed { profit, .. } => *profit,
                _ => 0.0,
            })
            .sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = &CloseOutcome> {
        self.outcomes.iter().filter(|o| !o.is_closed())
    }
}

impl Engine {
    /// Close an open order at the current time.
    ///
    /// Exit price is the TP level for `TakeProfit`, the SL level for
    /// `StopLoss`, and the current bar close otherwise. Only
    /// `SymbolNotFound` is returned as an error.
    pub fn try_close(
        &mut self,
        id: OrderId,
        reason: CloseReason,
    ) -> Result<CloseOutcome, EngineError> {
        let Some(index) = self.open.iter().position(|o| o.id == id) else {
            return Ok(if self.closed.iter().any(|o| o.id == id) {
                CloseOutcome::AlreadyClosed(id)
            } else {
                CloseOutcome::NotFound(id)
            });
        };

        let symbol = &self.open[index].symbol;
        let meta = self.registry.lookup(symbol)?;
        let bar = self.store.price_at(symbol, self.current_time)?;

        let mut order = self.open.remove(index);
        let profit = accounting::settle(
            &mut order,
            reason,
            bar,
            self.current_time,
            meta.scale,
            self.options.account_multiplier,
        );
        self.balance += profit;
        debug!(
            id = %order.id,
            status = %order.status,
            exit = order.exit_price,
            profit,
            "order closed manually"
        );
        self.closed.push(order);
        self.refresh_equity();
        Ok(CloseOutcome::Closed { id, profit })
    }

    /// Close an open order, returning its realised profit.
    ///
    /// Fails with `OrderNotFound` if the order is not in the open set; balance
    /// and equity are left untouched in that case.
    pub fn close_order(&mut self, id: OrderId, reason: CloseReason) -> Result<f64, EngineError> {
        match self.try_close(id, reason)? {
            CloseOutcome::Closed { profit, .. } => Ok(profit),
            CloseOutcome::AlreadyClosed(id) | CloseOutcome::NotFound(id) => {
                Err(EngineError::OrderNotFound(id))
            }
        }
    }

    /// Close every open order matching `filter` with reason `Close`.
    ///
    /// Best effort: an individual failure is recorded in the result and does
    /// not stop the batch.
    pub fn close_all(&mut self, filter: CloseFilter) -> Result<BulkClose, EngineError> {
        let targets: Vec<OrderId> = self
            .open
            .iter()
            .filter(|o| filter.matches(o.side))
            .map(|o| o.id)
            .collect();

        let mut bulk = BulkClose::default();
        for id in targets {
            let outcome = self.try_close(id, CloseReason::Close)?;
            if !outcome.is_closed() {
                warn!(?outcome, "bulk close skipped order");
            }
            bulk.outcomes.push(outcome);
        }
        Ok(bulk)
    }
}
