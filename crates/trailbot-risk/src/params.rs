//! Risk parameters.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use trailbot_core::TradingError;

/// Per-run risk settings. Fractions are expressed as 0.02 for 2%.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskParameters {
    /// Share of equity put at risk on one entry
    pub risk_fraction: Decimal,
    /// Gain over the entry price that closes the position
    pub take_profit_fraction: Decimal,
    /// Pullback from the high-water mark that closes the position
    pub trailing_stop_fraction: Decimal,
    /// Volatility multiple used as the per-unit risk distance
    pub atr_multiplier: Decimal,
}

impl Default for RiskParameters {
    fn default() -> Self {
        Self {
            risk_fraction: dec!(0.02),
            take_profit_fraction: dec!(0.05),
            trailing_stop_fraction: dec!(0.025),
            atr_multiplier: dec!(1.5),
        }
    }
}

impl RiskParameters {
    /// Validate the parameters.
    pub fn validate(&self) -> Result<(), TradingError> {
        if self.risk_fraction <= Decimal::ZERO || self.risk_fraction > Decimal::ONE {
            return Err(TradingError::Config(
                "risk_fraction must be in (0, 1]".into(),
            ));
        }
        if self.take_profit_fraction <= Decimal::ZERO {
            return Err(TradingError::Config(
                "take_profit_fraction must be greater than 0".into(),
            ));
        }
        if self.trailing_stop_fraction <= Decimal::ZERO
            || self.trailing_stop_fraction >= Decimal::ONE
        {
            return Err(TradingError::Config(
                "trailing_stop_fraction must be in (0, 1)".into(),
            ));
        }
        if self.atr_multiplier <= Decimal::ZERO {
            return Err(TradingError::Config(
                "atr_multiplier must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
