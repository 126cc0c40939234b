//! Trailbot CLI application.

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::path::PathBuf;
use trailbot_config::load_config;
use trailbot_monitor::setup_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Log format and file come from the config; a missing or invalid config
    // is reported by the command itself
    let logging = load_config(&cli.config).ok().map(|config| config.logging);
    let json = cli.json_logs || logging.as_ref().is_some_and(|l| l.is_json());
    let log_file = logging.and_then(|l| l.file).map(PathBuf::from);
    let _guard = setup_logging(cli.log_level.as_str(), json, log_file.as_deref())?;

    // Execute command
    match cli.command {
        Commands::Live(args) => cli::commands::live::run(args, &cli.config).await,
        Commands::Paper(args) => cli::commands::paper::run(args, &cli.config).await,
        Commands::Replay(args) => cli::commands::replay::run(args, &cli.config).await,
        Commands::ValidateConfig => cli::commands::validate::run(&cli.config).await,
    }
}
