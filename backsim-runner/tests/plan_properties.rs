//! Property tests for plan-driven runs over an in-memory store.
//!
//! Uses proptest to verify:
//! 1. With `close_at_end`, the last equity point has balance == equity
//! 2. The final balance is the initial balance plus the summed order profit

use backsim_core::{PriceBar, PriceSeries, PriceSeriesStore, Side};
use backsim_runner::{run_backtest_from_data, BacktestConfig, PlannedOrder};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use proptest::prelude::*;
use std::sync::Arc;

const CONFIG: &str = r#"
[engine]
use_trailing_stop = true
trail_fraction = 0.5

[data]
dir = "unused"

[run]
start = "2024-01-02T00:00:00"
end = "2024-01-02T00:01:00"

[[symbols]]
symbol = "EURUSD"
digits = 10000
tp_points = 20
sl_points = 15
spread_points = 2
lot = 0.1
"#;

fn base() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

// ── Strategies (proptest) ────────────────────────────────────────────

/// A random-walk OHLC path of one-minute bars.
fn arb_bars() -> impl Strategy<Value = Vec<PriceBar>> {
    prop::collection::vec(
        (-0.0015..0.0015_f64, 0.0..0.0010_f64, 0.0..0.0010_f64),
        5..60,
    )
    .prop_map(|steps| {
        let mut open = 1.1000;
        steps
            .into_iter()
            .enumerate()
            .map(|(i, (step, up, down))| {
                let close = open + step;
                let bar = PriceBar::new(
                    base() + Duration::minutes(i as i64),
                    open,
                    open.max(close) + up,
                    open.min(close) - down,
                    close,
                );
                open = close;
                bar
            })
            .collect()
    })
}

/// Plan entries as (minute offset, side, volume in tenths).
fn arb_plan() -> impl Strategy<Value = Vec<(i64, Side, u32)>> {
    prop::collection::vec(
        (
            0..60i64,
            prop_oneof![Just(Side::Buy), Just(Side::Sell)],
            1..50u32,
        ),
        0..12,
    )
}

fn config_for(bars: &[PriceBar], plan: &[(i64, Side, u32)]) -> BacktestConfig {
    let mut config = BacktestConfig::from_toml(CONFIG).unwrap();
    let last = bars.len() as i64 - 1;
    config.run.end = base() + Duration::minutes(last);
    config.orders = plan
        .iter()
        .map(|&(at, side, tenths)| PlannedOrder {
            at: base() + Duration::minutes(at.min(last)),
            side,
            symbol: "EURUSD".into(),
            volume: tenths as f64 / 10.0,
            tp_points: None,
            sl_points: None,
            label: None,
        })
        .collect();
    config
}

proptest! {
    #[test]
    fn closing_at_end_leaves_balance_equal_to_equity(
        bars in arb_bars(),
        plan in arb_plan(),
    ) {
        let config = config_for(&bars, &plan);
        let registry = Arc::new(config.registry());
        let store = Arc::new(PriceSeriesStore::from_series(vec![
            PriceSeries::new("EURUSD", bars).unwrap(),
        ]));

        let result = run_backtest_from_data(&config, registry, store, "hash").unwrap();

        let last = result.equity_curve.last().unwrap();
        prop_assert_eq!(last.balance, last.equity);
        prop_assert_eq!(result.metrics.open_count, 0);
        prop_assert_eq!(result.snapshot.orders.len(), plan.len());
        prop_assert!(result.unplaced_orders.is_empty());

        let realised = result.snapshot.equity_graph.last().copied().unwrap_or(0.0);
        prop_assert!(
            (result.metrics.final_balance - config.engine.initial_balance - realised).abs() < 1e-6
        );
    }
}
