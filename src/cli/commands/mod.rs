//! CLI command implementations.

pub mod live;
pub mod paper;
pub mod replay;
pub mod validate;

use anyhow::{Context, Result};
use std::path::Path;
use tokio::sync::watch;
use tracing::{info, warn};
use trailbot_config::{load_config, AppConfig};
use trailbot_engine::{CycleConfig, DecisionCycle, RunSummary, Scheduler};

use crate::cli::MarketArgs;

/// Load the config file and apply command-line market overrides.
pub fn load(config_path: &Path, market: &MarketArgs) -> Result<AppConfig> {
    let mut config = load_config(config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;

    if let Some(symbol) = &market.symbol {
        config.trading.symbol = symbol.clone();
    }
    if let Some(minutes) = market.interval {
        config.trading.bar_interval_minutes = minutes;
    }
    config.validate().context("Invalid command-line override")?;

    Ok(config)
}

/// Build the decision cycle settings from a validated config.
pub fn cycle_config(config: &AppConfig) -> Result<CycleConfig> {
    Ok(CycleConfig {
        symbol: config.trading.symbol.clone(),
        interval: config.trading.interval()?,
        lookback: config.trading.lookback_bars,
        time_in_force: config.execution.time_in_force,
        call_timeout: config.execution.call_timeout(),
        indicators: config.indicators,
        risk: config.risk,
    })
}

/// Resume any position the broker holds, run the scheduler until Ctrl-C,
/// then print the run summary.
pub async fn run_until_ctrl_c(cycle: &mut DecisionCycle) -> Result<RunSummary> {
    let state = cycle
        .reconcile()
        .await
        .context("Could not read the open position from the broker")?;
    info!(%state, "Starting state");

    let (tx, rx) = watch::channel(false);

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl-C, stopping after the current cycle"),
            Err(e) => warn!(error = %e, "Could not listen for Ctrl-C, stopping"),
        }
        let _ = tx.send(true);
    });

    let interval = cycle.config().interval.as_secs();
    let mut scheduler = Scheduler::new(std::time::Duration::from_secs(interval), rx);
    let summary = scheduler.run(cycle).await?;

    println!("{}", summary.summary());
    Ok(summary)
}
