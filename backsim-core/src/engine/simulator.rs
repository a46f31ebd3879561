//! The simulation clock and order engine.
//!
//! One `tick` is one discrete step:
//!
//! 1. Advance the clock by `delta`, then skip forward over gaps in the
//!    reference symbol's data so the *next* step lands on a real bar.
//! 2. Reset equity to the balance.
//! 3. For every open order (stable creation order): mark to the current
//!    bar, ratchet the trailing stop, check SL/TP, check the holding-time
//!    limit, rescore if still open.
//! 4. Commit: move closed orders to the closed set, recompute equity as
//!    `balance + Σ open profit`.
//!
//! The tick is computed against a working copy of the open set and committed
//! only after every order evaluated successfully, so a propagated error
//! leaves the engine untouched.

use crate::data::{PriceSeries, PriceSeriesStore};
use crate::domain::{CloseReason, Order, OrderId, Side, SymbolMetadata, SymbolRegistry};
use crate::engine::accounting;
use crate::engine::options::EngineOptions;
use crate::engine::state::{BundleStatus, TickReport};
use crate::engine::trigger;
use crate::error::EngineError;
use chrono::{Duration, NaiveDateTime};
use std::sync::Arc;
use tracing::{debug, trace};

/// A single simulation instance. Owns its orders, balance and clock; shares
/// the read-only registry and price store.
#[derive(Debug, Clone)]
pub struct Engine {
    pub(crate) options: EngineOptions,
    pub(crate) registry: Arc<SymbolRegistry>,
    pub(crate) store: Arc<PriceSeriesStore>,
    reference_symbol: String,
    pub(crate) current_time: NaiveDateTime,
    pub(crate) balance: f64,
    pub(crate) equity: f64,
    pub(crate) open: Vec<Order>,
    pub(crate) closed: Vec<Order>,
    created: u64,
}

impl Engine {
    /// Build an engine whose clock starts at the first bar of `reference_symbol`.
    pub fn new(
        options: EngineOptions,
        registry: Arc<SymbolRegistry>,
        store: Arc<PriceSeriesStore>,
        reference_symbol: &str,
    ) -> Result<Self, EngineError> {
        options.validate()?;
        let start = store.series(reference_symbol)?.first_time();
        let balance = options.initial_balance;
        Ok(Self {
            options,
            registry,
            store,
            reference_symbol: reference_symbol.to_string(),
            current_time: start,
            balance,
            equity: balance,
            open: Vec::new(),
            closed: Vec::new(),
            created: 0,
        })
    }

    // ── Accessors ──────────────────────────────────────────────────────

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn reference_symbol(&self) -> &str {
        &self.reference_symbol
    }

    pub fn current_time(&self) -> NaiveDateTime {
        self.current_time
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn equity(&self) -> f64 {
        self.equity
    }

    pub fn open_orders(&self) -> &[Order] {
        &self.open
    }

    pub fn closed_orders(&self) -> &[Order] {
        &self.closed
    }

    /// Find an order by ID in either collection.
    pub fn order(&self, id: OrderId) -> Option<&Order> {
        self.open
            .iter()
            .chain(self.closed.iter())
            .find(|o| o.id == id)
    }

    pub fn metadata(&self, symbol: &str) -> Result<&SymbolMetadata, EngineError> {
        self.registry.lookup(symbol)
    }

    pub fn series(&self, symbol: &str) -> Result<&PriceSeries, EngineError> {
        self.store.series(symbol)
    }

    pub fn store(&self) -> &PriceSeriesStore {
        &self.store
    }

    /// Position the clock, e.g. at a run's start before the first order.
    pub fn set_time(&mut self, time: NaiveDateTime) {
        self.current_time = time;
    }

    // ── Order creation ─────────────────────────────────────────────────

    /// Open an order at the current bar's open.
    ///
    /// Buys pay the spread (entry = open + spread); sells enter at the raw
    /// open. The order is scored once against the bar close and its profit
    /// added to equity so equity reflects it before the next tick.
    pub fn create_order(
        &mut self,
        side: Side,
        symbol: &str,
        volume: f64,
        tp_points: f64,
        sl_points: f64,
        label: impl Into<String>,
    ) -> Result<Order, EngineError> {
        let meta = self.registry.lookup(symbol)?;
        let bar = *self.store.price_at(symbol, self.current_time)?;
        if !(volume.is_finite() && volume > 0.0) {
            return Err(EngineError::InvalidVolume {
                symbol: symbol.to_string(),
                volume,
            });
        }

        let entry_price = match side {
            Side::Buy => bar.open + meta.spread,
            Side::Sell => bar.open,
        };
        let (take_profit, stop_loss) = trigger::exit_levels(
            side,
            entry_price,
            meta,
            tp_points,
            sl_points,
            self.options.stop_loss_enabled,
        );

        self.created += 1;
        let mut order = Order::new(
            OrderId(self.created),
            label.into(),
            side,
            symbol.to_string(),
            volume,
            self.current_time,
            entry_price,
            take_profit,
            stop_loss,
            bar.close,
        );
        accounting::rescore(&mut order, meta.scale, self.options.account_multiplier);
        self.equity += order.profit;

        debug!(
            id = %order.id,
            label = %order.label,
            side = %side,
            symbol,
            entry = order.entry_price,
            tp = order.take_profit,
            sl = ?order.stop_loss,
            "order opened"
        );
        self.open.push(order.clone());
        Ok(order)
    }

    /// Open an order using the symbol's registered default TP/SL distances.
    pub fn create_order_with_defaults(
        &mut self,
        side: Side,
        symbol: &str,
        volume: f64,
        label: impl Into<String>,
    ) -> Result<Order, EngineError> {
        let meta = self.registry.lookup(symbol)?;
        let (tp_points, sl_points) = (meta.default_tp_points(), meta.default_sl_points());
        self.create_order(side, symbol, volume, tp_points, sl_points, label)
    }

    // ── Clock ──────────────────────────────────────────────────────────

    /// Time after stepping `delta` from now, including gap skipping.
    ///
    /// While `t + delta` has no bar in the reference series and is still
    /// before its last bar, keep stepping. The current step itself is never
    /// skipped. Non-positive deltas do not skip.
    fn advance(&self, delta: Duration) -> Result<(NaiveDateTime, usize), EngineError> {
        let mut now = self.current_time + delta;
        let mut skipped = 0;
        if delta > Duration::zero() {
            let reference = self.store.series(&self.reference_symbol)?;
            let last = reference.last_time();
            while !reference.contains(now + delta) && now + delta < last {
                now += delta;
                skipped += 1;
            }
        }
        Ok((now, skipped))
    }

    /// Advance simulated time by `delta` and re-evaluate every open order.
    pub fn tick(&mut self, delta: Duration) -> Result<TickReport, EngineError> {
        let (now, skipped_steps) = self.advance(delta)?;
        let multiplier = self.options.account_multiplier;

        let mut balance = self.balance;
        let mut still_open = Vec::with_capacity(self.open.len());
        let mut closing = Vec::new();

        for current in &self.open {
            let mut order = current.clone();
            let meta = self.registry.lookup(&order.symbol)?;
            let bar = self.store.price_at(&order.symbol, now)?;

            order.exit_time = now;
            order.exit_price = bar.close;

            if self.options.use_trailing_stop {
                if let Some(stop) = trigger::trailed_stop(&order, bar, self.options.trail_fraction)
                {
                    trace!(id = %order.id, from = ?order.stop_loss, to = stop, "trailing stop");
                    order.stop_loss = Some(stop);
                }
            }

            let mut reason = trigger::check_exit(&order, bar, meta.spread);
            if reason.is_none()
                && self.options.use_time_based_close
                && order.entry_time + self.options.hold_duration <= now
            {
                reason = Some(CloseReason::Close);
            }

            match reason {
                Some(reason) => {
                    let profit =
                        accounting::settle(&mut order, reason, bar, now, meta.scale, multiplier);
                    balance += profit;
                    debug!(
                        id = %order.id,
                        status = %order.status,
                        exit = order.exit_price,
                        profit,
                        "order closed"
                    );
                    closing.push(order);
                }
                None => {
                    accounting::rescore(&mut order, meta.scale, multiplier);
                    still_open.push(order);
                }
            }
        }

        let closed_ids: Vec<OrderId> = closing.iter().map(|o| o.id).collect();
        self.current_time = now;
        self.balance = balance;
        self.open = still_open;
        self.closed.extend(closing);
        self.refresh_equity();

        trace!(
            time = %now,
            skipped_steps,
            open = self.open.len(),
            balance = self.balance,
            equity = self.equity,
            "tick"
        );

        Ok(TickReport {
            time: now,
            skipped_steps,
            closed: closed_ids,
            balance: self.balance,
            equity: self.equity,
        })
    }

    /// `equity = balance + Σ open profit`, summed in open-set order.
    pub(crate) fn refresh_equity(&mut self) {
        self.equity = self
            .open
            .iter()
            .fold(self.balance, |equity, order| equity + order.profit);
    }

    // ── Order maintenance ──────────────────────────────────────────────

    /// Rewrite TP/SL of every open order from its entry price with new distances.
    pub fn modify_take_profit_stop_loss(
        &mut self,
        tp_points: f64,
        sl_points: f64,
    ) -> Result<(), EngineError> {
        let levels = self
            .open
            .iter()
            .map(|order| {
                let meta = self.registry.lookup(&order.symbol)?;
                Ok(trigger::exit_levels(
                    order.side,
                    order.entry_price,
                    meta,
                    tp_points,
                    sl_points,
                    self.options.stop_loss_enabled,
                ))
            })
            .collect::<Result<Vec<_>, EngineError>>()?;

        for (order, (take_profit, stop_loss)) in self.open.iter_mut().zip(levels) {
            order.take_profit = take_profit;
            order.stop_loss = stop_loss;
        }
        Ok(())
    }

    /// Zero balance and equity and drop every order. The ID sequence keeps counting.
    pub fn reset_balance(&mut self) {
        self.balance = 0.0;
        self.equity = 0.0;
        self.open.clear();
        self.closed.clear();
    }

    /// Summary of open orders on `symbol` with the given side.
    pub fn bundle_status(&self, symbol: &str, side: Side) -> BundleStatus {
        let mut status = BundleStatus::default();
        let mut latest: Option<&Order> = None;
        for order in self
            .open
            .iter()
            .filter(|o| o.symbol == symbol && o.side == side)
        {
            status.count += 1;
            status.profit += order.profit;
            if latest.map_or(true, |l| order.entry_time > l.entry_time) {
                latest = Some(order);
            }
        }
        if let Some(order) = latest {
            status.last_entry_time = Some(order.entry_time);
            status.last_entry_price = Some(order.entry_price);
            status.last_label = Some(order.label.clone());
            status.last_step = order.label_step();
        }
        status
    }
}
