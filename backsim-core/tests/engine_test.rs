//! Integration tests for the tick engine.
//!
//! Tests:
//! 1. Exit triggers: TP, SL (with the Buy spread offset), SL-before-TP priority
//! 2. Trailing stop and time-based close
//! 3. Manual and bulk closing outcomes
//! 4. Equity identity across ticks, snapshots and determinism

use backsim_core::{
    CloseFilter, CloseOutcome, CloseReason, Engine, EngineError, EngineOptions, OrderId,
    OrderStatus, PriceBar, PriceSeries, PriceSeriesStore, Side, Snapshot, SymbolRegistry,
};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::sync::Arc;

const INITIAL: f64 = 50_000.0;

fn t(min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(10, min, 0)
        .unwrap()
}

/// Consecutive one-minute EURUSD bars from 10:00, given as (open, high, low, close).
fn eurusd(ohlc: &[(f64, f64, f64, f64)]) -> PriceSeries {
    let bars = ohlc
        .iter()
        .enumerate()
        .map(|(i, &(o, h, l, c))| PriceBar::new(t(i as u32), o, h, l, c))
        .collect();
    PriceSeries::new("EURUSD", bars).unwrap()
}

fn registry() -> Arc<SymbolRegistry> {
    let mut registry = SymbolRegistry::new();
    registry.register("EURUSD", 10000.0, 50.0, 30.0, 10.0, 0.1);
    Arc::new(registry)
}

fn engine_with(options: EngineOptions, ohlc: &[(f64, f64, f64, f64)]) -> Engine {
    let store = PriceSeriesStore::from_series(vec![eurusd(ohlc)]);
    Engine::new(options, registry(), Arc::new(store), "EURUSD").unwrap()
}

fn minute() -> Duration {
    Duration::minutes(1)
}

fn assert_equity_identity(engine: &Engine) {
    let expected = engine
        .open_orders()
        .iter()
        .fold(engine.balance(), |acc, o| acc + o.profit);
    assert_eq!(engine.equity(), expected);
}

/// Quiet market around 1.1000 that never reaches the default TP/SL levels.
fn quiet(n: usize) -> Vec<(f64, f64, f64, f64)> {
    (0..n)
        .map(|i| {
            let c = 1.1000 + (i % 3) as f64 * 0.0002;
            (c, c + 0.0003, c - 0.0003, c)
        })
        .collect()
}

// ──────────────────────────────────────────────
// Exit triggers
// ──────────────────────────────────────────────

#[test]
fn buy_take_profit_closes_at_tp_level() {
    let mut engine = engine_with(
        EngineOptions::default(),
        &[
            (1.1000, 1.1005, 1.0995, 1.1002),
            (1.1002, 1.1030, 1.1000, 1.1025),
            (1.1025, 1.1070, 1.1020, 1.1065),
            (1.1065, 1.1070, 1.1060, 1.1068),
        ],
    );
    let order = engine
        .create_order(Side::Buy, "EURUSD", 1.0, 50.0, 30.0, "Buy-1")
        .unwrap();

    let r = engine.tick(minute()).unwrap();
    assert!(r.closed.is_empty());
    assert_eq!(engine.open_orders().len(), 1);

    let r = engine.tick(minute()).unwrap();
    assert_eq!(r.time, t(2));
    assert_eq!(r.closed, vec![order.id]);

    let closed = &engine.closed_orders()[0];
    assert_eq!(closed.status, OrderStatus::TakeProfit);
    assert!(closed.closed);
    assert_eq!(closed.exit_time, t(2));
    assert_eq!(closed.exit_price, closed.take_profit);
    let expected = 1.0 * 1.0 * (closed.take_profit - closed.entry_price) * 10000.0 * 10.0;
    assert_eq!(closed.profit, expected);
    assert!((closed.profit - 500.0).abs() < 1e-6);

    assert_eq!(engine.balance(), INITIAL + expected);
    assert_eq!(engine.equity(), engine.balance());
    assert!(engine.open_orders().is_empty());
}

#[test]
fn sell_stop_loss_fires_on_touch() {
    let mut engine = engine_with(
        EngineOptions::default(),
        &[
            (1.1000, 1.1005, 1.0995, 1.1002),
            (1.1002, 1.1040, 1.1000, 1.1035),
            (1.1035, 1.1040, 1.1030, 1.1035),
        ],
    );
    let order = engine
        .create_order(Side::Sell, "EURUSD", 1.0, 50.0, 30.0, "Sell-1")
        .unwrap();
    let sl = order.stop_loss.unwrap();

    let r = engine.tick(minute()).unwrap();
    assert_eq!(r.closed, vec![order.id]);

    let closed = &engine.closed_orders()[0];
    assert_eq!(closed.status, OrderStatus::StopLoss);
    assert_eq!(closed.exit_price, sl);
    assert!((closed.profit + 300.0).abs() < 1e-6);
    assert_eq!(engine.balance(), INITIAL + closed.profit);
}

#[test]
fn buy_stop_loss_needs_the_spread_beyond_the_level() {
    // Entry 1.1010, SL 1.0980, trigger only once low <= 1.0970.
    let mut engine = engine_with(
        EngineOptions::default(),
        &[
            (1.1000, 1.1005, 1.0995, 1.1000),
            (1.1000, 1.1001, 1.0975, 1.0980),
            (1.0980, 1.0985, 1.0960, 1.0965),
            (1.0965, 1.0970, 1.0960, 1.0965),
        ],
    );
    let order = engine
        .create_order(Side::Buy, "EURUSD", 1.0, 50.0, 30.0, "Buy-1")
        .unwrap();

    let r = engine.tick(minute()).unwrap();
    assert!(r.closed.is_empty(), "low inside the spread band must not trigger");

    let r = engine.tick(minute()).unwrap();
    assert_eq!(r.closed, vec![order.id]);
    let closed = engine.order(order.id).unwrap();
    assert_eq!(closed.status, OrderStatus::StopLoss);
    assert_eq!(closed.exit_price, order.stop_loss.unwrap());
}

#[test]
fn stop_loss_wins_when_bar_spans_both_levels() {
    let mut engine = engine_with(
        EngineOptions::default(),
        &[
            (1.1000, 1.1005, 1.0995, 1.1000),
            (1.1000, 1.1100, 1.0900, 1.1000),
            (1.1000, 1.1005, 1.0995, 1.1000),
        ],
    );
    let order = engine
        .create_order(Side::Buy, "EURUSD", 1.0, 50.0, 30.0, "Buy-1")
        .unwrap();
    engine.tick(minute()).unwrap();
    assert_eq!(engine.order(order.id).unwrap().status, OrderStatus::StopLoss);
}

#[test]
fn take_profit_only_orders_ride_through_drawdowns() {
    let mut engine = engine_with(
        EngineOptions::take_profit_only(),
        &[
            (1.1000, 1.1005, 1.0995, 1.1000),
            (1.1000, 1.1001, 1.0800, 1.0850),
            (1.0850, 1.0900, 1.0840, 1.0890),
        ],
    );
    let order = engine
        .create_order(Side::Buy, "EURUSD", 1.0, 50.0, 30.0, "Buy-1")
        .unwrap();
    assert_eq!(order.stop_loss, None);

    engine.tick(minute()).unwrap();
    engine.tick(minute()).unwrap();
    let open = engine.order(order.id).unwrap();
    assert!(open.is_open());
    assert!(open.profit < 0.0);
    assert_equity_identity(&engine);
}

// ──────────────────────────────────────────────
// Trailing stop and time-based close
// ──────────────────────────────────────────────

#[test]
fn trailing_stop_ratchets_and_locks_in_profit() {
    // Entry 1.1010, TP 1.1060, trail = 0.0050 * 0.5 = 0.0025.
    let options = EngineOptions {
        use_trailing_stop: true,
        trail_fraction: 0.5,
        ..EngineOptions::default()
    };
    let mut engine = engine_with(
        options,
        &[
            (1.1000, 1.1005, 1.0995, 1.1000),
            (1.1000, 1.1045, 1.1015, 1.1040),
            (1.1025, 1.1030, 1.1012, 1.1020),
            (1.1020, 1.1022, 1.1000, 1.1005),
        ],
    );
    let order = engine
        .create_order(Side::Buy, "EURUSD", 1.0, 50.0, 30.0, "Buy-1")
        .unwrap();

    engine.tick(minute()).unwrap();
    let moved = engine.order(order.id).unwrap().stop_loss.unwrap();
    assert!((moved - 1.1020).abs() < 1e-9);

    // Lower high: candidate 1.1005 would loosen the stop, so it stays.
    engine.tick(minute()).unwrap();
    let held = engine.order(order.id).unwrap();
    assert!(held.is_open());
    assert_eq!(held.stop_loss, Some(moved));

    engine.tick(minute()).unwrap();
    let closed = engine.order(order.id).unwrap();
    assert_eq!(closed.status, OrderStatus::StopLoss);
    assert_eq!(closed.exit_price, moved);
    assert!(closed.profit > 0.0);
}

#[test]
fn time_based_close_after_hold_duration() {
    let options = EngineOptions {
        use_time_based_close: true,
        hold_duration: Duration::minutes(2),
        ..EngineOptions::default()
    };
    let bars = quiet(5);
    let mut engine = engine_with(options, &bars);
    let order = engine
        .create_order(Side::Sell, "EURUSD", 1.0, 50.0, 30.0, "Sell-1")
        .unwrap();

    let r = engine.tick(minute()).unwrap();
    assert!(r.closed.is_empty());

    let r = engine.tick(minute()).unwrap();
    assert_eq!(r.closed, vec![order.id]);
    let closed = engine.order(order.id).unwrap();
    assert_eq!(closed.status, OrderStatus::Close);
    assert_eq!(closed.exit_time, t(2));
    assert_eq!(closed.exit_price, bars[2].3);
}

// ──────────────────────────────────────────────
// Manual and bulk close
// ──────────────────────────────────────────────

#[test]
fn close_all_after_one_order_was_closed_manually() {
    let mut engine = engine_with(EngineOptions::default(), &quiet(4));
    let buy = engine
        .create_order(Side::Buy, "EURUSD", 1.0, 50.0, 30.0, "Buy-1")
        .unwrap();
    let sell = engine
        .create_order(Side::Sell, "EURUSD", 2.0, 50.0, 30.0, "Sell-1")
        .unwrap();
    engine.tick(minute()).unwrap();

    let sell_profit = engine.close_order(sell.id, CloseReason::Close).unwrap();
    assert_equity_identity(&engine);

    let bulk = engine.close_all(CloseFilter::All).unwrap();
    assert_eq!(bulk.outcomes.len(), 1);
    assert_eq!(bulk.closed_count(), 1);
    assert_eq!(bulk.failures().count(), 0);
    let buy_profit = bulk.realized();

    assert!(engine.open_orders().is_empty());
    assert_eq!(engine.closed_orders().len(), 2);
    assert_eq!(engine.balance(), INITIAL + sell_profit + buy_profit);
    assert_eq!(engine.equity(), engine.balance());
    assert_eq!(engine.order(buy.id).unwrap().status, OrderStatus::Close);
}

#[test]
fn closing_twice_is_rejected_without_side_effects() {
    let mut engine = engine_with(EngineOptions::default(), &quiet(3));
    let order = engine
        .create_order(Side::Buy, "EURUSD", 1.0, 50.0, 30.0, "Buy-1")
        .unwrap();
    engine.close_order(order.id, CloseReason::Close).unwrap();
    let (balance, equity) = (engine.balance(), engine.equity());

    assert_eq!(
        engine.try_close(order.id, CloseReason::Close).unwrap(),
        CloseOutcome::AlreadyClosed(order.id)
    );
    assert_eq!(
        engine.close_order(order.id, CloseReason::Close),
        Err(EngineError::OrderNotFound(order.id))
    );
    assert_eq!(
        engine.try_close(OrderId(99), CloseReason::Close).unwrap(),
        CloseOutcome::NotFound(OrderId(99))
    );
    assert_eq!(engine.balance(), balance);
    assert_eq!(engine.equity(), equity);
    assert_eq!(engine.closed_orders().len(), 1);
}

#[test]
fn manual_close_with_reason_uses_that_level() {
    let mut engine = engine_with(EngineOptions::default(), &quiet(3));
    let order = engine
        .create_order(Side::Sell, "EURUSD", 1.0, 50.0, 30.0, "Sell-1")
        .unwrap();
    engine.close_order(order.id, CloseReason::TakeProfit).unwrap();
    let closed = engine.order(order.id).unwrap();
    assert_eq!(closed.status, OrderStatus::TakeProfit);
    assert_eq!(closed.exit_price, order.take_profit);
}

#[test]
fn close_all_by_side_leaves_the_other_side_open() {
    let mut engine = engine_with(EngineOptions::default(), &quiet(3));
    engine
        .create_order(Side::Buy, "EURUSD", 1.0, 50.0, 30.0, "Buy-1")
        .unwrap();
    engine
        .create_order(Side::Buy, "EURUSD", 1.0, 50.0, 30.0, "Buy-2")
        .unwrap();
    let sell = engine
        .create_order(Side::Sell, "EURUSD", 1.0, 50.0, 30.0, "Sell-1")
        .unwrap();

    let bulk = engine.close_all(CloseFilter::BuySide).unwrap();
    assert_eq!(bulk.closed_count(), 2);
    assert_eq!(engine.open_orders().len(), 1);
    assert_eq!(engine.open_orders()[0].id, sell.id);
    assert_equity_identity(&engine);
}

// ──────────────────────────────────────────────
// Accounting, reporting, determinism
// ──────────────────────────────────────────────

#[test]
fn equity_identity_holds_every_tick() {
    let mut engine = engine_with(EngineOptions::default(), &quiet(10));
    for step in 0..4 {
        let side = if step % 2 == 0 { Side::Buy } else { Side::Sell };
        engine
            .create_order(side, "EURUSD", 0.5, 50.0, 30.0, format!("{side}-{step}"))
            .unwrap();
        assert_equity_identity(&engine);
        let r = engine.tick(minute()).unwrap();
        assert_eq!(r.equity, engine.equity());
        assert_equity_identity(&engine);
    }
}

#[test]
fn snapshot_lists_closed_then_open_with_running_profit() {
    let mut engine = engine_with(EngineOptions::default(), &quiet(4));
    let first = engine
        .create_order(Side::Buy, "EURUSD", 1.0, 50.0, 30.0, "Buy-1")
        .unwrap();
    let second = engine
        .create_order(Side::Sell, "EURUSD", 1.0, 50.0, 30.0, "Sell-1")
        .unwrap();
    engine.tick(minute()).unwrap();
    engine.close_order(second.id, CloseReason::Close).unwrap();

    let snap = Snapshot::capture(&engine).unwrap();
    assert_eq!(snap.current_time, t(1));
    assert_eq!(snap.orders.len(), 2);
    assert_eq!(snap.orders[0].id, second.id);
    assert_eq!(snap.orders[1].id, first.id);
    assert_eq!(snap.closed_count(), 1);
    assert_eq!(snap.open_count(), 1);

    let total: f64 = engine
        .closed_orders()
        .iter()
        .chain(engine.open_orders())
        .map(|o| o.profit)
        .sum();
    assert_eq!(snap.equity_graph.len(), 2);
    assert!((snap.equity_graph[1] - total).abs() < 1e-9);
    assert_eq!(snap.balance, engine.balance());
    assert_eq!(snap.equity, engine.equity());
}

#[test]
fn identical_inputs_reproduce_identical_state() {
    let run = || {
        let options = EngineOptions::full(0.3, Duration::minutes(4));
        let mut engine = engine_with(options, &quiet(12));
        for i in 0..6 {
            let side = if i % 3 == 0 { Side::Sell } else { Side::Buy };
            engine
                .create_order(side, "EURUSD", 1.0, 20.0, 10.0, format!("{side}-{i}"))
                .unwrap();
            engine.tick(minute()).unwrap();
        }
        Snapshot::capture(&engine).unwrap()
    };
    assert_eq!(run(), run());
}

#[test]
fn order_on_symbol_without_data_is_rejected() {
    let mut registry = SymbolRegistry::new();
    registry.register("EURUSD", 10000.0, 50.0, 30.0, 10.0, 0.1);
    registry.register("GBPUSD", 10000.0, 50.0, 30.0, 10.0, 0.1);
    let store = PriceSeriesStore::from_series(vec![eurusd(&quiet(3))]);
    let mut engine = Engine::new(
        EngineOptions::default(),
        Arc::new(registry),
        Arc::new(store),
        "EURUSD",
    )
    .unwrap();

    let err = engine
        .create_order(Side::Buy, "GBPUSD", 1.0, 50.0, 30.0, "Buy-1")
        .unwrap_err();
    assert_eq!(err, EngineError::SymbolNotFound("GBPUSD".into()));
    assert_eq!(engine.equity(), INITIAL);
    assert!(engine.tick(minute()).is_ok());
}
