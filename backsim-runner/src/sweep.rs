//! Trailing-stop sweep: the same plan replayed under several trail fractions.
//!
//! Every variant gets its own engine; the registry and price store are loaded
//! once and shared between the parallel runs.

use rayon::prelude::*;
use std::sync::Arc;
use tracing::info;

use backsim_core::{PriceSeriesStore, SymbolRegistry};
use serde::{Deserialize, Serialize};

use crate::config::BacktestConfig;
use crate::data_loader::load_store;
use crate::runner::{run_backtest_from_data, BacktestResult, RunError};

/// One row of a sweep summary table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepRow {
    pub trail_fraction: f64,
    pub run_id: String,
    pub trades: usize,
    pub win_rate: f64,
    pub final_balance: f64,
    pub final_equity: f64,
    pub max_drawdown: f64,
}

impl From<&BacktestResult> for SweepRow {
    fn from(result: &BacktestResult) -> Self {
        Self {
            trail_fraction: result.trail_fraction,
            run_id: result.run_id.clone(),
            trades: result.metrics.trade_count,
            win_rate: result.metrics.win_rate,
            final_balance: result.metrics.final_balance,
            final_equity: result.metrics.final_equity,
            max_drawdown: result.metrics.max_drawdown,
        }
    }
}

/// Configs for each fraction, with the trailing stop switched on.
pub fn trail_variants(base: &BacktestConfig, fractions: &[f64]) -> Vec<BacktestConfig> {
    fractions
        .iter()
        .map(|&fraction| {
            let mut config = base.clone();
            config.engine.use_trailing_stop = true;
            config.engine.trail_fraction = fraction;
            config
        })
        .collect()
}

/// Run every variant in parallel over shared data. Results keep `fractions` order.
pub fn run_trail_sweep_from_data(
    base: &BacktestConfig,
    fractions: &[f64],
    registry: Arc<SymbolRegistry>,
    store: Arc<PriceSeriesStore>,
    dataset_hash: &str,
) -> Result<Vec<BacktestResult>, RunError> {
    let variants = trail_variants(base, fractions);
    for config in &variants {
        config.validate()?;
    }
    info!(variants = variants.len(), "sweep started");

    variants
        .par_iter()
        .map(|config| {
            run_backtest_from_data(
                config,
                Arc::clone(&registry),
                Arc::clone(&store),
                dataset_hash,
            )
        })
        .collect()
}

/// Load the base config's data once, then sweep.
pub fn run_trail_sweep(
    base: &BacktestConfig,
    fractions: &[f64],
) -> Result<Vec<BacktestResult>, RunError> {
    base.validate()?;
    let loaded = load_store(&base.data.dir, &base.symbol_names(), &base.data.date_format)?;
    run_trail_sweep_from_data(
        base,
        fractions,
        Arc::new(base.registry()),
        Arc::new(loaded.store),
        &loaded.dataset_hash,
    )
}

/// The result with the highest final equity; ties keep the earliest.
pub fn best_by_equity(results: &[BacktestResult]) -> Option<&BacktestResult> {
    results.iter().reduce(|best, r| {
        if r.metrics.final_equity > best.metrics.final_equity {
            r
        } else {
            best
        }
    })
}
