//! Backtest runner: wires together config, data, order plan and engine.
//!
//! Two entry points:
//! - `run_single_backtest()`: loads CSV data named by the config, then runs. Used by the CLI.
//! - `run_backtest_from_data()`: takes a pre-loaded store. Used by sweeps.
//!
//! The run loop: position the clock at `run.start`, place every plan entry
//! whose time has come, then tick by `tick_minutes` until `run.end`, placing
//! due entries after each tick and recording balance and equity.

use std::sync::Arc;
use std::time::Instant;

use backsim_core::{
    CloseFilter, Engine, EngineError, PriceSeriesStore, Side, Snapshot, SymbolRegistry,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{BacktestConfig, ConfigError, PlannedOrder, RunId};
use crate::data_loader::{load_store, LoadError};
use crate::metrics::RunMetrics;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Account state after one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub time: NaiveDateTime,
    pub balance: f64,
    pub equity: f64,
}

/// Complete result of a single run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub dataset_hash: String,
    pub reference_symbol: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub trail_fraction: f64,
    pub initial_balance: f64,
    pub tick_count: usize,
    /// Ticks' worth of time jumped over data gaps.
    pub skipped_steps: usize,
    /// Labels of plan entries that never came due before `end`.
    pub unplaced_orders: Vec<String>,
    pub metrics: RunMetrics,
    pub snapshot: Snapshot,
    pub equity_curve: Vec<EquityPoint>,
    pub duration_secs: f64,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Load the config's data files, then run.
pub fn run_single_backtest(config: &BacktestConfig) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let loaded = load_store(
        &config.data.dir,
        &config.symbol_names(),
        &config.data.date_format,
    )?;
    run_backtest_from_data(
        config,
        Arc::new(config.registry()),
        Arc::new(loaded.store),
        &loaded.dataset_hash,
    )
}

/// Run against an already-loaded store: no I/O.
pub fn run_backtest_from_data(
    config: &BacktestConfig,
    registry: Arc<SymbolRegistry>,
    store: Arc<PriceSeriesStore>,
    dataset_hash: &str,
) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let started = Instant::now();
    let run_id = config.run_id()?;
    let options = config.to_engine_options();
    let reference = config
        .reference_symbol()
        .ok_or_else(|| ConfigError::Invalid("no reference symbol".into()))?
        .to_string();

    let mut engine = Engine::new(options, registry, store, &reference)?;
    engine.set_time(config.run.start);
    info!(
        run_id = %&run_id[..12.min(run_id.len())],
        reference = %reference,
        start = %config.run.start,
        end = %config.run.end,
        planned = config.orders.len(),
        "backtest started"
    );

    let mut plan = OrderPlan::new(&config.orders);
    let delta = config.tick_delta();
    let mut tick_count = 0;
    let mut skipped_steps = 0;

    plan.place_due(&mut engine)?;
    let mut equity_curve = vec![point(&engine)];

    while engine.current_time() < config.run.end {
        let report = engine.tick(delta)?;
        tick_count += 1;
        skipped_steps += report.skipped_steps;
        plan.place_due(&mut engine)?;
        equity_curve.push(point(&engine));
    }

    let unplaced_orders = plan.remaining_labels();
    for label in &unplaced_orders {
        warn!(label = %label, "plan entry never came due");
    }

    if config.run.close_at_end {
        let bulk = engine.close_all(CloseFilter::All)?;
        debug!(closed = bulk.closed_count(), realized = bulk.realized(), "closed at end");
        if let Some(last) = equity_curve.last_mut() {
            *last = point(&engine);
        }
    }

    let snapshot = Snapshot::capture(&engine)?;
    let equity_values: Vec<f64> = equity_curve.iter().map(|p| p.equity).collect();
    let metrics = RunMetrics::compute(&snapshot, &equity_values, config.engine.initial_balance);

    info!(
        trades = metrics.trade_count,
        balance = metrics.final_balance,
        equity = metrics.final_equity,
        ticks = tick_count,
        "backtest finished"
    );

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id,
        dataset_hash: dataset_hash.to_string(),
        reference_symbol: reference,
        start: config.run.start,
        end: config.run.end,
        trail_fraction: config.engine.trail_fraction,
        initial_balance: config.engine.initial_balance,
        tick_count,
        skipped_steps,
        unplaced_orders,
        metrics,
        snapshot,
        equity_curve,
        duration_secs: started.elapsed().as_secs_f64(),
    })
}

fn point(engine: &Engine) -> EquityPoint {
    EquityPoint {
        time: engine.current_time(),
        balance: engine.balance(),
        equity: engine.equity(),
    }
}

/// Plan entries in time order with a cursor over those already placed.
struct OrderPlan<'a> {
    entries: Vec<&'a PlannedOrder>,
    next: usize,
    buys: usize,
    sells: usize,
}

impl<'a> OrderPlan<'a> {
    fn new(orders: &'a [PlannedOrder]) -> Self {
        let mut entries: Vec<&PlannedOrder> = orders.iter().collect();
        entries.sort_by_key(|o| o.at);
        Self {
            entries,
            next: 0,
            buys: 0,
            sells: 0,
        }
    }

    /// Place every entry due at or before the engine's clock.
    fn place_due(&mut self, engine: &mut Engine) -> Result<(), EngineError> {
        while let Some(&planned) = self.entries.get(self.next) {
            if planned.at > engine.current_time() {
                break;
            }
            let label = self.label_for(planned);
            let meta = engine.metadata(&planned.symbol)?;
            let tp_points = planned.tp_points.unwrap_or_else(|| meta.default_tp_points());
            let sl_points = planned.sl_points.unwrap_or_else(|| meta.default_sl_points());
            engine.create_order(
                planned.side,
                &planned.symbol,
                planned.volume,
                tp_points,
                sl_points,
                label,
            )?;
            self.next += 1;
        }
        Ok(())
    }

    /// Explicit label, else `"<Side>-<n>"` counting per side.
    fn label_for(&mut self, planned: &PlannedOrder) -> String {
        let step = match planned.side {
            Side::Buy => {
                self.buys += 1;
                self.buys
            }
            Side::Sell => {
                self.sells += 1;
                self.sells
            }
        };
        planned
            .label
            .clone()
            .unwrap_or_else(|| format!("{}-{step}", planned.side))
    }

    fn remaining_labels(&self) -> Vec<String> {
        self.entries[self.next..]
            .iter()
            .map(|o| {
                o.label
                    .clone()
                    .unwrap_or_else(|| format!("{} {} @ {}", o.side, o.symbol, o.at))
            })
            .collect()
    }
}
