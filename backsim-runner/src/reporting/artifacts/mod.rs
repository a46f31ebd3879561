//! Artifact manager for persisting run outputs.

mod equity;
mod orders;
mod summary;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::runner::BacktestResult;

pub use summary::RunSummary;

/// Length of the run-id prefix used for run directory names.
pub const RUN_DIR_ID_LEN: usize = 16;

/// Artifact paths returned after export.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub run_dir: PathBuf,
    pub orders_csv: PathBuf,
    pub orders_json: PathBuf,
    pub equity_csv: PathBuf,
    pub summary_json: PathBuf,
}

/// Writes every artifact of a run under `<output_dir>/<run id prefix>/`.
#[derive(Debug, Clone)]
pub struct ArtifactManager {
    output_dir: PathBuf,
}

impl ArtifactManager {
    pub fn new(output_dir: impl AsRef<Path>) -> Result<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&output_dir)
            .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;
        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn run_dir(&self, result: &BacktestResult) -> PathBuf {
        let len = RUN_DIR_ID_LEN.min(result.run_id.len());
        self.output_dir.join(&result.run_id[..len])
    }

    pub fn save_run(&self, result: &BacktestResult) -> Result<ArtifactPaths> {
        let run_dir = self.run_dir(result);
        std::fs::create_dir_all(&run_dir)
            .with_context(|| format!("Failed to create run directory {}", run_dir.display()))?;

        let orders_csv = run_dir.join("orders.csv");
        let orders_json = run_dir.join("orders.json");
        orders::write_orders_csv(&orders_csv, &result.snapshot.orders)?;
        orders::write_orders_json(&orders_json, &result.snapshot.orders)?;

        let equity_csv = run_dir.join("equity.csv");
        equity::write_equity_csv(&equity_csv, &result.equity_curve)?;

        let summary_json = run_dir.join("summary.json");
        summary::write_summary(&summary_json, result)?;

        Ok(ArtifactPaths {
            run_dir,
            orders_csv,
            orders_json,
            equity_csv,
            summary_json,
        })
    }
}
