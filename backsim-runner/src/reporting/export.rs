//! Export entry points for single runs and sweeps.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::reporting::artifacts::{ArtifactManager, ArtifactPaths};
use crate::runner::BacktestResult;
use crate::sweep::SweepRow;

/// Save the full artifact set for one run under `output_dir`.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<ArtifactPaths> {
    ArtifactManager::new(output_dir)?.save_run(result)
}

/// Save each sweep variant's artifacts plus a `sweep.csv` comparison table.
///
/// Returns the path of the table.
pub fn export_sweep(results: &[BacktestResult], output_dir: &Path) -> Result<PathBuf> {
    let manager = ArtifactManager::new(output_dir)?;
    for result in results {
        manager
            .save_run(result)
            .with_context(|| format!("Failed to save sweep variant {}", result.trail_fraction))?;
    }

    let path = manager.output_dir().join("sweep.csv");
    let mut wtr = csv::Writer::from_path(&path)
        .with_context(|| format!("Failed to create sweep CSV {}", path.display()))?;
    wtr.write_record([
        "trail_fraction",
        "run_id",
        "trades",
        "win_rate",
        "final_balance",
        "final_equity",
        "max_drawdown",
    ])?;
    for row in results.iter().map(SweepRow::from) {
        wtr.write_record([
            &row.trail_fraction.to_string(),
            &row.run_id,
            &row.trades.to_string(),
            &format!("{:.4}", row.win_rate),
            &format!("{:.2}", row.final_balance),
            &format!("{:.2}", row.final_equity),
            &format!("{:.4}", row.max_drawdown),
        ])?;
    }
    wtr.flush().context("Failed to flush sweep CSV")?;
    Ok(path)
}
