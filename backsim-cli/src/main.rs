//! BackSim CLI: run, sweep and validate commands.
//!
//! Commands:
//! - `run`: execute a backtest from a TOML config file and save artifacts
//! - `sweep`: replay the config's order plan under several trailing-stop fractions
//! - `validate`: parse and check a config, and confirm its data files load

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, Level};

use backsim_runner::reporting::{export_sweep, save_artifacts};
use backsim_runner::{
    best_by_equity, load_store, run_single_backtest, run_trail_sweep, BacktestConfig,
    BacktestResult,
};

#[derive(Parser)]
#[command(name = "backsim", about = "BackSim CLI: discrete-time OHLC backtesting engine")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest from a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Output directory for run artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Also print the final snapshot as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Run the config once per trailing-stop fraction, in parallel.
    Sweep {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Comma-separated trail fractions in [0, 1], e.g. 0.2,0.5,0.8.
        #[arg(long, value_delimiter = ',', required = true)]
        trail: Vec<f64>,

        /// Output directory for per-variant artifacts and sweep.csv.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Check a config file and load its data without running.
    Validate {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            config,
            output_dir,
            json,
        } => run_backtest_cmd(config, output_dir, json),
        Commands::Sweep {
            config,
            trail,
            output_dir,
        } => run_sweep_cmd(config, trail, output_dir),
        Commands::Validate { config } => run_validate_cmd(config),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: &Path) -> Result<BacktestConfig> {
    let config = BacktestConfig::from_file(path)
        .with_context(|| format!("Failed to load config {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid config {}", path.display()))?;
    Ok(config)
}

fn run_backtest_cmd(config_path: PathBuf, output_dir: PathBuf, json: bool) -> Result<()> {
    let config = load_config(&config_path)?;
    let result = run_single_backtest(&config)?;

    print_summary(&result);
    if json {
        println!("{}", serde_json::to_string_pretty(&result.snapshot)?);
    }

    let paths = save_artifacts(&result, &output_dir)?;
    println!("Artifacts saved to: {}", paths.run_dir.display());
    Ok(())
}

fn run_sweep_cmd(config_path: PathBuf, fractions: Vec<f64>, output_dir: PathBuf) -> Result<()> {
    if fractions.is_empty() {
        bail!("--trail needs at least one fraction");
    }
    let config = load_config(&config_path)?;
    let results = run_trail_sweep(&config, &fractions)?;

    println!();
    println!("=== Trailing Stop Sweep ===");
    println!(
        "{:>8} {:>7} {:>9} {:>14} {:>14} {:>9}",
        "trail", "trades", "win rate", "balance", "equity", "max dd"
    );
    for r in &results {
        println!(
            "{:>8.3} {:>7} {:>8.1}% {:>14.2} {:>14.2} {:>8.2}%",
            r.trail_fraction,
            r.metrics.trade_count,
            r.metrics.win_rate * 100.0,
            r.metrics.final_balance,
            r.metrics.final_equity,
            r.metrics.max_drawdown * 100.0
        );
    }
    if let Some(best) = best_by_equity(&results) {
        println!("Best trail fraction by equity: {}", best.trail_fraction);
    }

    let table = export_sweep(&results, &output_dir)?;
    println!("Sweep table saved to: {}", table.display());
    Ok(())
}

fn run_validate_cmd(config_path: PathBuf) -> Result<()> {
    let config = load_config(&config_path)?;
    let loaded = load_store(
        &config.data.dir,
        &config.symbol_names(),
        &config.data.date_format,
    )
    .context("Failed to load price data")?;

    let run_id = config.run_id()?;
    info!(run_id = %run_id, "config valid");
    for (symbol, bars) in &loaded.bar_counts {
        println!("{symbol:<10} {bars} bars");
    }
    println!("Orders planned: {}", config.orders.len());
    println!("Dataset hash:   {}", loaded.dataset_hash);
    println!("OK");
    Ok(())
}

fn print_summary(result: &BacktestResult) {
    let m = &result.metrics;
    println!();
    println!("=== Backtest Result ===");
    println!("Run:            {}", result.run_id);
    println!("Reference:      {}", result.reference_symbol);
    println!("Period:         {} to {}", result.start, result.end);
    println!(
        "Ticks:          {} ({} skipped over gaps)",
        result.tick_count, result.skipped_steps
    );
    println!("Trades:         {} closed, {} open", m.trade_count, m.open_count);
    println!(
        "Exits:          {} TP, {} SL, {} close",
        m.take_profit_count, m.stop_loss_count, m.manual_close_count
    );
    println!();
    println!("--- Performance ---");
    println!("Final Balance:  {:.2}", m.final_balance);
    println!("Final Equity:   {:.2}", m.final_equity);
    println!("Realized P&L:   {:.2}", m.realized_pnl);
    println!("Total Return:   {:.2}%", m.total_return * 100.0);
    println!("Max Drawdown:   {:.2}%", m.max_drawdown * 100.0);
    println!("Win Rate:       {:.1}%", m.win_rate * 100.0);
    println!("Profit Factor:  {:.2}", m.profit_factor);
    for label in &result.unplaced_orders {
        println!("WARNING: plan entry '{label}' never came due");
    }
}
