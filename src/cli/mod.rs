//! CLI definitions.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "trailbot")]
#[command(author, version, about = "Single-asset trend/momentum trader with trailing-stop exits")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Log level
    #[arg(short, long, default_value = "info")]
    pub log_level: LogLevel,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Trade through Alpaca until Ctrl-C
    Live(LiveArgs),
    /// Trade live market data against an in-memory paper account until Ctrl-C
    Paper(PaperArgs),
    /// Replay historical bars from a CSV file
    Replay(ReplayArgs),
    /// Validate configuration
    ValidateConfig,
}

/// Overrides for the configured market.
#[derive(clap::Args, Clone, Default)]
pub struct MarketArgs {
    /// Symbol to trade, e.g. ETH/USD
    #[arg(short = 'S', long)]
    pub symbol: Option<String>,

    /// Bar interval in minutes
    #[arg(short, long)]
    pub interval: Option<u32>,
}

#[derive(clap::Args)]
pub struct LiveArgs {
    #[command(flatten)]
    pub market: MarketArgs,

    /// Use the live endpoint instead of Alpaca paper trading
    #[arg(long)]
    pub live: bool,
}

#[derive(clap::Args)]
pub struct PaperArgs {
    #[command(flatten)]
    pub market: MarketArgs,

    /// Initial capital (defaults to trading.initial_capital)
    #[arg(long)]
    pub capital: Option<Decimal>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(clap::Args)]
pub struct ReplayArgs {
    /// Data file (CSV)
    #[arg(long)]
    pub data: PathBuf,

    #[command(flatten)]
    pub market: MarketArgs,

    /// Initial capital (defaults to trading.initial_capital)
    #[arg(long)]
    pub capital: Option<Decimal>,

    /// Output format
    #[arg(long, default_value = "text")]
    pub output: OutputFormat,

    /// Save the JSON report to a file
    #[arg(long)]
    pub save: Option<PathBuf>,
}
