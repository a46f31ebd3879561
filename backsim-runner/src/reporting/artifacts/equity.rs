//! Per-tick balance/equity export (CSV).

use anyhow::{Context, Result};
use std::path::Path;

use crate::runner::EquityPoint;

pub fn write_equity_csv(path: &Path, curve: &[EquityPoint]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create equity CSV {}", path.display()))?;
    wtr.write_record(["time", "balance", "equity"])?;
    for point in curve {
        wtr.write_record([
            &point.time.to_string(),
            &format!("{:.2}", point.balance),
            &format!("{:.2}", point.equity),
        ])?;
    }
    wtr.flush()
        .with_context(|| format!("Failed to flush equity CSV {}", path.display()))?;
    Ok(())
}
