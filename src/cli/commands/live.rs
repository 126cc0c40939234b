//! Live trading command implementation.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use trailbot_broker::{AlpacaBroker, AlpacaConfig};
use trailbot_data::AlpacaCryptoSource;
use trailbot_engine::DecisionCycle;
use trailbot_strategy::TrendMomentum;

use super::{cycle_config, load, run_until_ctrl_c};
use crate::cli::LiveArgs;

pub async fn run(args: LiveArgs, config_path: &Path) -> Result<()> {
    let config = load(config_path, &args.market)?;
    let paper = config.alpaca.paper && !args.live;

    let alpaca = AlpacaConfig::from_env_vars(
        &config.alpaca.api_key_env,
        &config.alpaca.api_secret_env,
        paper,
    )
    .with_context(|| {
        format!(
            "Set {} and {} to your Alpaca credentials",
            config.alpaca.api_key_env, config.alpaca.api_secret_env
        )
    })?
    .with_timeout(config.execution.call_timeout());

    let source = AlpacaCryptoSource::with_credentials(
        &alpaca.api_key,
        &alpaca.api_secret,
        config.execution.call_timeout(),
    )?;
    let broker = AlpacaBroker::new(alpaca)?;

    if paper {
        info!(symbol = %config.trading.symbol, "Trading against the Alpaca paper endpoint");
    } else {
        warn!(symbol = %config.trading.symbol, "LIVE TRADING: orders use real funds");
    }

    let mut cycle = DecisionCycle::new(
        cycle_config(&config)?,
        Arc::new(source),
        Arc::new(broker),
        Box::new(TrendMomentum::new()),
    )?;

    run_until_ctrl_c(&mut cycle).await?;
    Ok(())
}
