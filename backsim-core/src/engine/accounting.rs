//! Profit formula and order settlement.
//!
//! `profit = volume * side.sign * (exit - entry) * scale * account_multiplier`
//!
//! The same formula scores open (unrealised) and closed (realised) orders;
//! only the finality of the exit price differs.

use crate::domain::{CloseReason, Order, PriceBar, Side};
use chrono::NaiveDateTime;

pub fn order_profit(
    side: Side,
    volume: f64,
    entry_price: f64,
    exit_price: f64,
    scale: f64,
    account_multiplier: f64,
) -> f64 {
    volume * side.sign() * (exit_price - entry_price) * scale * account_multiplier
}

/// Recompute an order's profit from its current exit price.
pub fn rescore(order: &mut Order, scale: f64, account_multiplier: f64) {
    order.profit = order_profit(
        order.side,
        order.volume,
        order.entry_price,
        order.exit_price,
        scale,
        account_multiplier,
    );
}

/// Exit price for a close: the TP or SL level when one fired, the bar close otherwise.
pub fn exit_price_for(order: &Order, reason: CloseReason, bar: &PriceBar) -> f64 {
    match reason {
        CloseReason::TakeProfit => order.take_profit,
        CloseReason::StopLoss => order.stop_loss.unwrap_or(bar.close),
        CloseReason::Close | CloseReason::None => bar.close,
    }
}

/// Finalise an order: set exit, realise profit, mark closed.
///
/// The caller owns moving the order between collections and crediting the balance.
pub fn settle(
    order: &mut Order,
    reason: CloseReason,
    bar: &PriceBar,
    now: NaiveDateTime,
    scale: f64,
    account_multiplier: f64,
) -> f64 {
    order.exit_time = now;
    order.exit_price = exit_price_for(order, reason, bar);
    rescore(order, scale, account_multiplier);
    order.status = reason.into();
    order.closed = true;
    order.profit
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OrderId, OrderStatus};
    use chrono::NaiveDate;

    fn ts(min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(10, min, 0)
            .unwrap()
    }

    fn order(side: Side) -> Order {
        Order::new(
            OrderId(1),
            "t".into(),
            side,
            "EURUSD".into(),
            2.0,
            ts(0),
            1.1000,
            if side == Side::Buy { 1.1050 } else { 1.0950 },
            Some(if side == Side::Buy { 1.0970 } else { 1.1030 }),
            1.1000,
        )
    }

    #[test]
    fn buy_profit_positive_when_price_rises() {
        let p = order_profit(Side::Buy, 1.0, 1.1000, 1.1010, 10000.0, 10.0);
        assert!((p - 100.0).abs() < 1e-6);
    }

    #[test]
    fn sell_profit_positive_when_price_falls() {
        let p = order_profit(Side::Sell, 1.0, 1.1000, 1.0990, 10000.0, 10.0);
        assert!((p - 100.0).abs() < 1e-6);
    }

    #[test]
    fn profit_scales_with_volume() {
        let one = order_profit(Side::Buy, 1.0, 100.0, 101.0, 10.0, 10.0);
        let three = order_profit(Side::Buy, 3.0, 100.0, 101.0, 10.0, 10.0);
        assert!((three - 3.0 * one).abs() < 1e-9);
    }

    #[test]
    fn settle_take_profit_exits_at_tp_level() {
        let mut o = order(Side::Buy);
        let bar = PriceBar::new(ts(5), 1.1040, 1.1060, 1.1030, 1.1045);
        let profit = settle(&mut o, CloseReason::TakeProfit, &bar, ts(5), 10000.0, 10.0);
        assert_eq!(o.exit_price, 1.1050);
        assert_eq!(o.exit_time, ts(5));
        assert_eq!(o.status, OrderStatus::TakeProfit);
        assert!(o.closed);
        assert_eq!(profit, o.profit);
    }

    #[test]
    fn settle_stop_loss_exits_at_stop_level() {
        let mut o = order(Side::Sell);
        let bar = PriceBar::new(ts(5), 1.1020, 1.1035, 1.1010, 1.1025);
        settle(&mut o, CloseReason::StopLoss, &bar, ts(5), 10000.0, 10.0);
        assert_eq!(o.exit_price, 1.1030);
        assert!(o.profit < 0.0);
    }

    #[test]
    fn settle_close_exits_at_bar_close() {
        let mut o = order(Side::Buy);
        let bar = PriceBar::new(ts(5), 1.1020, 1.1035, 1.1010, 1.1025);
        settle(&mut o, CloseReason::Close, &bar, ts(5), 10000.0, 10.0);
        assert_eq!(o.exit_price, 1.1025);
        assert_eq!(o.status, OrderStatus::Close);
    }
}
