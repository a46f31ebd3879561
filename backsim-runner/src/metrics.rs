//! Run metrics: pure functions over closed-order profits and the equity curve.

use backsim_core::{OrderStatus, Snapshot};
use serde::{Deserialize, Serialize};

/// Aggregate statistics for a single run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub trade_count: usize,
    pub open_count: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub realized_pnl: f64,
    pub unrealized_pnl: f64,
    pub take_profit_count: usize,
    pub stop_loss_count: usize,
    pub manual_close_count: usize,
    pub final_balance: f64,
    pub final_equity: f64,
    pub total_return: f64,
    /// Largest peak-to-trough equity decline, as a negative fraction.
    pub max_drawdown: f64,
}

impl RunMetrics {
    /// `equity_curve` is the per-tick equity; `initial` the starting balance.
    pub fn compute(snapshot: &Snapshot, equity_curve: &[f64], initial: f64) -> Self {
        let closed: Vec<_> = snapshot.orders.iter().filter(|o| o.closed).collect();
        let profits: Vec<f64> = closed.iter().map(|o| o.profit).collect();
        let count_status =
            |status: OrderStatus| closed.iter().filter(|o| o.status == status).count();

        Self {
            trade_count: closed.len(),
            open_count: snapshot.open_count(),
            wins: profits.iter().filter(|&&p| p > 0.0).count(),
            losses: profits.iter().filter(|&&p| p < 0.0).count(),
            win_rate: win_rate(&profits),
            profit_factor: profit_factor(&profits),
            realized_pnl: snapshot.balance - initial,
            unrealized_pnl: snapshot.equity - snapshot.balance,
            take_profit_count: count_status(OrderStatus::TakeProfit),
            stop_loss_count: count_status(OrderStatus::StopLoss),
            manual_close_count: count_status(OrderStatus::Close),
            final_balance: snapshot.balance,
            final_equity: snapshot.equity,
            total_return: total_return(initial, snapshot.equity),
            max_drawdown: max_drawdown(equity_curve),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

pub fn total_return(initial: f64, final_equity: f64) -> f64 {
    if initial <= 0.0 {
        return 0.0;
    }
    (final_equity - initial) / initial
}

/// Fraction of closed orders with positive profit.
pub fn win_rate(profits: &[f64]) -> f64 {
    if profits.is_empty() {
        return 0.0;
    }
    let winners = profits.iter().filter(|&&p| p > 0.0).count();
    winners as f64 / profits.len() as f64
}

/// Gross profit / gross loss, capped at 100.0 when there are no losses.
pub fn profit_factor(profits: &[f64]) -> f64 {
    let gross_profit: f64 = profits.iter().filter(|&&p| p > 0.0).sum();
    let gross_loss: f64 = profits.iter().filter(|&&p| p < 0.0).map(|p| p.abs()).sum();

    if gross_loss < 1e-10 {
        return if gross_profit > 0.0 { 100.0 } else { 0.0 };
    }
    (gross_profit / gross_loss).min(100.0)
}

pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    let Some(&first) = equity_curve.first() else {
        return 0.0;
    };
    let mut peak = first;
    let mut max_dd = 0.0_f64;
    for &eq in equity_curve {
        peak = peak.max(eq);
        if peak > 0.0 {
            max_dd = max_dd.min((eq - peak) / peak);
        }
    }
    max_dd
}
