//! Pool simulator binary
//!
//! Usage:
//!   pool-simulator --config config/pool_simulator.toml
//!   AMM_GLOBAL__LOG_LEVEL=debug pool-simulator --config scenario.toml --json-logs

use anyhow::{Context, Result};
use clap::Parser;
use pool_config::load_config;
use pool_simulator::Simulator;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pool-simulator")]
#[command(about = "Replay scripted operations against a constant product pool")]
#[command(version)]
struct Args {
    /// Path to scenario configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(short, long)]
    log_level: Option<String>,

    /// Enable JSON logging format
    #[arg(long)]
    json_logs: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref())?;

    let log_level = args
        .log_level
        .as_deref()
        .unwrap_or(config.global.log_level.as_str());
    init_logging(log_level, args.json_logs || config.global.json_logs)?;

    info!(
        accounts = config.accounts.len(),
        steps = config.steps.len(),
        "Starting pool simulation"
    );

    let mut simulator = Simulator::from_config(&config)?;
    let report = simulator.run(&config.steps);

    let failed = report.steps.iter().filter(|s| s.error.is_some()).count();
    info!(
        failed,
        total_shares = report.total_shares,
        "Simulation complete"
    );

    let rendered = serde_json::to_string_pretty(&report).context("Failed to render report")?;
    println!("{}", rendered);
    Ok(())
}

/// Logs go to stderr so the JSON report on stdout stays machine readable
fn init_logging(log_level: &str, json_logs: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .with_context(|| format!("Invalid log level: {}", log_level))?;

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    Ok(())
}
