//! BackSim Runner: configuration, data loading and orchestration.
//!
//! This crate builds on `backsim-core` to provide:
//! - TOML run configuration with validation and content-addressed run ids
//! - CSV bar loading into a shared price store, with a dataset hash
//! - A plan-driven run loop that places scripted orders as the clock reaches them
//! - Parallel trailing-stop sweeps over one loaded store
//! - Run metrics and artifact export (orders, equity curve, summary)

pub mod config;
pub mod data_loader;
pub mod metrics;
pub mod reporting;
pub mod runner;
pub mod sweep;

pub use config::{BacktestConfig, ConfigError, PlannedOrder, RunId, DEFAULT_DATE_FORMAT};
pub use data_loader::{load_series, load_store, LoadError, LoadedData};
pub use metrics::RunMetrics;
pub use runner::{
    run_backtest_from_data, run_single_backtest, BacktestResult, EquityPoint, RunError,
};
pub use sweep::{best_by_equity, run_trail_sweep, run_trail_sweep_from_data, SweepRow};
