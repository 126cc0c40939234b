//! Replay command implementation.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;
use trailbot_data::{resample, CsvDataSource};
use trailbot_engine::{ReplayConfig, ReplayEngine};

use super::{cycle_config, load};
use crate::cli::{OutputFormat, ReplayArgs};

pub async fn run(args: ReplayArgs, config_path: &Path) -> Result<()> {
    let config = load(config_path, &args.market)?;
    let cycle = cycle_config(&config)?;

    let capital = args.capital.unwrap_or(config.trading.initial_capital);
    if capital <= rust_decimal::Decimal::ZERO {
        anyhow::bail!("--capital must be greater than 0");
    }

    let source = CsvDataSource::new(&args.data)
        .with_context(|| format!("Data file '{}' does not exist", args.data.display()))?;
    let raw = source.load_all()?;
    let bars = resample(&raw, cycle.interval);
    info!(rows = raw.len(), bars = bars.len(), interval = %cycle.interval, "Loaded history");

    let engine = ReplayEngine::new(ReplayConfig {
        cycle,
        initial_capital: capital,
        slippage_pct: config.execution.slippage_pct,
        commission_pct: config.execution.commission_pct,
    });
    let report = engine.run(bars).await?;

    match args.output {
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Text => println!("{}", report.summary.summary()),
    }

    if let Some(save_path) = &args.save {
        std::fs::write(save_path, report.to_json()?)?;
        info!("Results saved to {:?}", save_path);
    }

    Ok(())
}
