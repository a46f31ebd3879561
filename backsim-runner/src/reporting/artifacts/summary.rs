//! Run summary export (JSON).

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::metrics::RunMetrics;
use crate::runner::BacktestResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub schema_version: u32,
    pub run_id: String,
    pub dataset_hash: String,
    pub written_at: chrono::DateTime<chrono::Utc>,
    pub duration_secs: f64,
    pub reference_symbol: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub trail_fraction: f64,
    pub initial_balance: f64,
    pub tick_count: usize,
    pub skipped_steps: usize,
    pub unplaced_orders: Vec<String>,
    pub metrics: RunMetrics,
}

impl From<&BacktestResult> for RunSummary {
    fn from(result: &BacktestResult) -> Self {
        Self {
            schema_version: result.schema_version,
            run_id: result.run_id.clone(),
            dataset_hash: result.dataset_hash.clone(),
            written_at: chrono::Utc::now(),
            duration_secs: result.duration_secs,
            reference_symbol: result.reference_symbol.clone(),
            start: result.start,
            end: result.end,
            trail_fraction: result.trail_fraction,
            initial_balance: result.initial_balance,
            tick_count: result.tick_count,
            skipped_steps: result.skipped_steps,
            unplaced_orders: result.unplaced_orders.clone(),
            metrics: result.metrics.clone(),
        }
    }
}

pub fn write_summary(path: &Path, result: &BacktestResult) -> Result<()> {
    let summary = RunSummary::from(result);
    let json =
        serde_json::to_string_pretty(&summary).context("Failed to serialize run summary")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write summary to {}", path.display()))?;
    Ok(())
}
