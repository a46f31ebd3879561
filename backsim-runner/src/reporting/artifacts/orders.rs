//! Order tape export (CSV/JSON).

use anyhow::{Context, Result};
use std::path::Path;

use backsim_core::OrderRecord;

pub fn write_orders_csv(path: &Path, orders: &[OrderRecord]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create orders CSV {}", path.display()))?;

    wtr.write_record([
        "id",
        "label",
        "symbol",
        "side",
        "volume",
        "entry_time",
        "entry_price",
        "stop_loss",
        "take_profit",
        "exit_time",
        "exit_price",
        "profit",
        "status",
        "entry_bar_high",
        "entry_bar_low",
        "exit_bar_high",
        "exit_bar_low",
    ])?;

    for o in orders {
        wtr.write_record([
            &o.id.0.to_string(),
            &o.label,
            &o.symbol,
            &o.side.to_string(),
            &o.volume.to_string(),
            &o.entry_time.to_string(),
            &format!("{:.5}", o.entry_price),
            &o.stop_loss.map(|sl| format!("{sl:.5}")).unwrap_or_default(),
            &format!("{:.5}", o.take_profit),
            &o.exit_time.to_string(),
            &format!("{:.5}", o.exit_price),
            &o.profit.to_string(),
            &o.status.to_string(),
            &format!("{:.5}", o.entry_bar_high),
            &format!("{:.5}", o.entry_bar_low),
            &format!("{:.5}", o.exit_bar_high),
            &format!("{:.5}", o.exit_bar_low),
        ])?;
    }

    wtr.flush()
        .with_context(|| format!("Failed to flush orders CSV {}", path.display()))?;
    Ok(())
}

pub fn write_orders_json(path: &Path, orders: &[OrderRecord]) -> Result<()> {
    let json = serde_json::to_string_pretty(orders).context("Failed to serialize orders")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write orders JSON {}", path.display()))?;
    Ok(())
}
