//! Configuration structures.

use config::ConfigError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use trailbot_core::types::{BarInterval, TimeInForce};
use trailbot_indicators::{IndicatorEngine, IndicatorParams};
use trailbot_risk::RiskParameters;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub alpaca: AlpacaSettings,
    #[serde(default)]
    pub trading: TradingSettings,
    #[serde(default)]
    pub indicators: IndicatorParams,
    #[serde(default)]
    pub risk: RiskParameters,
    #[serde(default)]
    pub execution: ExecutionSettings,
}

/// General app settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "trailbot".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Check if JSON output was requested.
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

/// Alpaca API configuration. Credentials are read from the named variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlpacaSettings {
    pub api_key_env: String,
    pub api_secret_env: String,
    /// Trade against the paper endpoint
    pub paper: bool,
}

impl Default for AlpacaSettings {
    fn default() -> Self {
        Self {
            api_key_env: "ALPACA_API_KEY".to_string(),
            api_secret_env: "ALPACA_API_SECRET".to_string(),
            paper: true,
        }
    }
}

/// What to trade and how much history to look at.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TradingSettings {
    pub symbol: String,
    pub bar_interval_minutes: u32,
    /// Bars fetched per cycle; must cover the indicator warm-up
    pub lookback_bars: usize,
    /// Starting cash for the paper broker and replays
    pub initial_capital: Decimal,
}

impl Default for TradingSettings {
    fn default() -> Self {
        Self {
            symbol: "ETH/USD".to_string(),
            bar_interval_minutes: 15,
            lookback_bars: 100,
            initial_capital: dec!(10000),
        }
    }
}

impl TradingSettings {
    /// Get the bar interval.
    pub fn interval(&self) -> Result<BarInterval, ConfigError> {
        BarInterval::from_minutes(self.bar_interval_minutes).ok_or_else(|| {
            ConfigError::Message("trading.bar_interval_minutes must be greater than 0".into())
        })
    }
}

/// Order and gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionSettings {
    pub time_in_force: TimeInForce,
    /// Bound on every data and broker call
    pub call_timeout_secs: u64,
    /// Paper broker slippage, in percent
    pub slippage_pct: Decimal,
    /// Paper broker commission, in percent of traded value
    pub commission_pct: Decimal,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            time_in_force: TimeInForce::GTC,
            call_timeout_secs: 30,
            slippage_pct: dec!(0.05),
            commission_pct: Decimal::ZERO,
        }
    }
}

impl ExecutionSettings {
    /// Get the call timeout.
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::Message(msg.into())
}

fn check_fraction(name: &str, value: Decimal) -> Result<(), ConfigError> {
    if value <= Decimal::ZERO || value >= Decimal::ONE {
        return Err(invalid(format!("risk.{} must be in (0, 1), got {}", name, value)));
    }
    Ok(())
}

impl AppConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let trading = &self.trading;
        if trading.symbol.trim().is_empty() {
            return Err(invalid("trading.symbol must not be empty"));
        }
        trading.interval()?;
        if trading.initial_capital <= Decimal::ZERO {
            return Err(invalid("trading.initial_capital must be greater than 0"));
        }

        let engine = IndicatorEngine::new(self.indicators).map_err(|e| invalid(e.to_string()))?;
        if trading.lookback_bars < engine.warmup_period() {
            return Err(invalid(format!(
                "trading.lookback_bars ({}) must cover the {}-bar indicator warm-up",
                trading.lookback_bars,
                engine.warmup_period()
            )));
        }

        check_fraction("risk_fraction", self.risk.risk_fraction)?;
        check_fraction("take_profit_fraction", self.risk.take_profit_fraction)?;
        check_fraction("trailing_stop_fraction", self.risk.trailing_stop_fraction)?;
        if self.risk.atr_multiplier <= Decimal::ZERO {
            return Err(invalid("risk.atr_multiplier must be greater than 0"));
        }

        if self.execution.call_timeout_secs == 0 {
            return Err(invalid("execution.call_timeout_secs must be greater than 0"));
        }
        if self.execution.slippage_pct < Decimal::ZERO || self.execution.commission_pct < Decimal::ZERO {
            return Err(invalid("execution slippage and commission must not be negative"));
        }

        Ok(())
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| invalid(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        config.validate().unwrap();

        assert_eq!(config.trading.symbol, "ETH/USD");
        assert_eq!(config.trading.interval().unwrap().minutes(), 15);
        assert_eq!(config.risk.atr_multiplier, dec!(1.5));
        assert_eq!(config.execution.call_timeout(), Duration::from_secs(30));
        assert!(config.alpaca.paper);
    }

    #[test]
    fn test_rejects_bad_values() {
        let cases: Vec<fn(&mut AppConfig)> = vec![
            |c: &mut AppConfig| c.trading.symbol = " ".into(),
            |c: &mut AppConfig| c.trading.bar_interval_minutes = 0,
            |c: &mut AppConfig| c.trading.initial_capital = Decimal::ZERO,
            |c: &mut AppConfig| c.trading.lookback_bars = 49,
            |c: &mut AppConfig| c.indicators.rsi_period = 0,
            |c: &mut AppConfig| c.indicators.sma_long = 0,
            |c: &mut AppConfig| c.risk.risk_fraction = Decimal::ZERO,
            |c: &mut AppConfig| c.risk.take_profit_fraction = Decimal::ONE,
            |c: &mut AppConfig| c.risk.trailing_stop_fraction = dec!(-0.1),
            |c: &mut AppConfig| c.risk.atr_multiplier = Decimal::ZERO,
            |c: &mut AppConfig| c.execution.call_timeout_secs = 0,
            |c: &mut AppConfig| c.execution.slippage_pct = dec!(-1),
        ];

        for (i, mutate) in cases.into_iter().enumerate() {
            let mut config = AppConfig::default();
            mutate(&mut config);
            assert!(config.validate().is_err(), "case {} should be rejected", i);
        }
    }

    #[test]
    fn test_window_order_is_not_constrained() {
        let mut config = AppConfig::default();
        config.indicators.sma_short = 50;
        config.indicators.sma_long = 20;
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_partial_toml() {
        let raw = r#"
            [trading]
            symbol = "BTC/USD"
            bar_interval_minutes = 5

            [risk]
            trailing_stop_fraction = 0.03

            [execution]
            time_in_force = "ioc"
        "#;

        let config: AppConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.trading.symbol, "BTC/USD");
        assert_eq!(config.trading.lookback_bars, 100);
        assert_eq!(config.risk.trailing_stop_fraction, dec!(0.03));
        assert_eq!(config.risk.take_profit_fraction, dec!(0.05));
        assert_eq!(config.execution.time_in_force, TimeInForce::IOC);
        assert_eq!(config.indicators, IndicatorParams::default());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = AppConfig::default();
        let rendered = config.to_toml().unwrap();
        let parsed: AppConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.trading.symbol, config.trading.symbol);
        assert_eq!(parsed.risk, config.risk);
    }
}
