//! Configuration management.

mod settings;

pub use settings::{
    AlpacaSettings, AppConfig, AppSettings, ExecutionSettings, LoggingConfig, TradingSettings,
};

pub use config::ConfigError;
use config::{Config, Environment, File};
use std::path::Path;

/// Load configuration from file and environment, then validate it.
///
/// Environment variables prefixed `TRAILBOT__` override file values, with
/// `__` separating sections, e.g. `TRAILBOT__TRADING__SYMBOL=BTC/USD`.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from(path).required(true))
        .add_source(
            Environment::with_prefix("TRAILBOT")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let app: AppConfig = config.try_deserialize()?;
    app.validate()?;
    Ok(app)
}
