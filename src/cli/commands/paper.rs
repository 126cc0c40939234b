//! Paper trading command implementation.

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use trailbot_broker::PaperBroker;
use trailbot_data::AlpacaCryptoSource;
use trailbot_engine::DecisionCycle;
use trailbot_strategy::TrendMomentum;

use super::{cycle_config, load, run_until_ctrl_c};
use crate::cli::PaperArgs;

pub async fn run(args: PaperArgs, config_path: &Path) -> Result<()> {
    let config = load(config_path, &args.market)?;
    let capital = args.capital.unwrap_or(config.trading.initial_capital);
    if capital <= rust_decimal::Decimal::ZERO {
        anyhow::bail!("--capital must be greater than 0");
    }

    let source = AlpacaCryptoSource::new(config.execution.call_timeout())?;
    let broker = Arc::new(
        PaperBroker::new(capital)
            .with_slippage(config.execution.slippage_pct)
            .with_commission(config.execution.commission_pct),
    );

    info!(symbol = %config.trading.symbol, %capital, "Paper trading on live market data");

    let mut cycle = DecisionCycle::new(
        cycle_config(&config)?,
        Arc::new(source),
        broker.clone(),
        Box::new(TrendMomentum::new()),
    )?;

    run_until_ctrl_c(&mut cycle).await?;

    let portfolio = broker.portfolio_snapshot()?;
    info!(
        cash = %portfolio.cash,
        equity = %portfolio.equity,
        realized = %portfolio.total_realized_pnl,
        return_pct = %portfolio.total_return().round_dp(2),
        "Final paper account"
    );
    Ok(())
}
