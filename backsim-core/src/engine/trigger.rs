//! Exit levels and intrabar trigger checks.
//!
//! Triggers are evaluated against the bar's high/low, not its close, so an
//! intrabar touch of a level closes the order.

use crate::domain::{CloseReason, Order, PriceBar, Side, SymbolMetadata};

/// Take-profit and stop-loss levels for an entry, from point distances.
///
/// TP sits on the favourable side of the entry, SL on the unfavourable side.
/// Returns no SL when stop-losses are disabled.
pub fn exit_levels(
    side: Side,
    entry_price: f64,
    meta: &SymbolMetadata,
    tp_points: f64,
    sl_points: f64,
    stop_loss_enabled: bool,
) -> (f64, Option<f64>) {
    let tp_distance = meta.points_to_price(tp_points);
    let sl_distance = meta.points_to_price(sl_points);
    let take_profit = entry_price + side.sign() * tp_distance;
    let stop_loss = stop_loss_enabled.then(|| entry_price - side.sign() * sl_distance);
    (take_profit, stop_loss)
}

/// Proposed trailing stop for this bar, or `None` if the stop stays put.
///
/// `trail = |tp - entry| * fraction`. A Buy stop moves up to `high - trail`
/// once price has run more than `trail` past entry; a Sell stop moves down
/// to `low + trail`. The stop never widens. The take-profit guard compares
/// the extreme offset by the raw fraction, not by the trail distance.
pub fn trailed_stop(order: &Order, bar: &PriceBar, fraction: f64) -> Option<f64> {
    let stop_loss = order.stop_loss?;
    let trail = (order.take_profit - order.entry_price).abs() * fraction;

    match order.side {
        Side::Buy => {
            let high = bar.high;
            let candidate = high - trail;
            (high - order.entry_price > trail
                && candidate > stop_loss
                && high - fraction < order.take_profit)
                .then_some(candidate)
        }
        Side::Sell => {
            let low = bar.low;
            let candidate = low + trail;
            (order.entry_price - low > trail
                && candidate < stop_loss
                && low + fraction > order.take_profit)
                .then_some(candidate)
        }
    }
}

/// Check SL then TP against the bar. First match wins.
///
/// Buy stop-losses fire only once the low clears the stop by the spread;
/// Sell stop-losses fire on a plain touch.
pub fn check_exit(order: &Order, bar: &PriceBar, spread: f64) -> Option<CloseReason> {
    match order.side {
        Side::Buy => {
            if order.stop_loss.is_some_and(|sl| bar.low <= sl - spread) {
                Some(CloseReason::StopLoss)
            } else if bar.high >= order.take_profit {
                Some(CloseReason::TakeProfit)
            } else {
                None
            }
        }
        Side::Sell => {
            if order.stop_loss.is_some_and(|sl| bar.high >= sl) {
                Some(CloseReason::StopLoss)
            } else if bar.low <= order.take_profit {
                Some(CloseReason::TakeProfit)
            } else {
                None
            }
        }
    }
}
