//! Validate configuration command.

use anyhow::Result;
use std::path::Path;
use trailbot_config::load_config;
use trailbot_indicators::IndicatorEngine;

pub async fn run(config_path: &Path) -> Result<()> {
    println!("Validating configuration: {:?}", config_path);

    match load_config(config_path) {
        Ok(config) => {
            let warmup = IndicatorEngine::new(config.indicators)?.warmup_period();

            println!("Configuration is valid!");
            println!();
            println!("App: {}", config.app.name);
            println!("Environment: {}", config.app.environment);
            println!("Log level: {}", config.logging.level);
            println!("Alpaca paper mode: {}", config.alpaca.paper);
            println!("Symbol: {}", config.trading.symbol);
            println!("Bar interval: {}m", config.trading.bar_interval_minutes);
            println!(
                "Lookback: {} bars (warm-up {})",
                config.trading.lookback_bars, warmup
            );
            println!(
                "Risk: {} of equity, take-profit {}, trailing stop {}, ATR x{}",
                config.risk.risk_fraction,
                config.risk.take_profit_fraction,
                config.risk.trailing_stop_fraction,
                config.risk.atr_multiplier
            );
            println!();
            println!("{}", config.to_toml()?);
        }
        Err(e) => {
            println!("Configuration error: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
