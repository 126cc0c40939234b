//! Volatility-scaled position sizing.

use rust_decimal::Decimal;
use trailbot_core::error::SizingError;

use crate::RiskParameters;

/// Sizes entries so that an adverse move of `atr_multiplier` volatility
/// units costs `risk_fraction` of equity.
///
/// ```text
/// risk_amount = equity * risk_fraction
/// units       = risk_amount / (atr_multiplier * volatility)
/// notional    = units * price
/// ```
#[derive(Debug, Clone, Copy)]
pub struct VolatilitySizer {
    risk_fraction: Decimal,
    atr_multiplier: Decimal,
}

impl VolatilitySizer {
    /// Notional values are rounded to cents.
    pub const NOTIONAL_DP: u32 = 2;

    /// Create a new sizer.
    pub fn new(risk_fraction: Decimal, atr_multiplier: Decimal) -> Self {
        Self {
            risk_fraction,
            atr_multiplier,
        }
    }

    /// Create a sizer from the run's risk parameters.
    pub fn from_params(params: &RiskParameters) -> Self {
        Self::new(params.risk_fraction, params.atr_multiplier)
    }

    /// Calculate the notional to buy.
    ///
    /// # Errors
    /// - `DegenerateVolatility` when `volatility <= 0`
    /// - `InvalidInput` for negative equity or price, or on overflow
    pub fn size(
        &self,
        equity: Decimal,
        price: Decimal,
        volatility: Decimal,
    ) -> Result<Decimal, SizingError> {
        if volatility <= Decimal::ZERO {
            return Err(SizingError::DegenerateVolatility(volatility));
        }
        if equity < Decimal::ZERO {
            return Err(SizingError::InvalidInput(format!(
                "equity must not be negative, got {}",
                equity
            )));
        }
        if price < Decimal::ZERO {
            return Err(SizingError::InvalidInput(format!(
                "price must not be negative, got {}",
                price
            )));
        }

        let overflow = || SizingError::InvalidInput("position size overflow".into());

        let risk_amount = equity.checked_mul(self.risk_fraction).ok_or_else(overflow)?;
        let risk_per_unit = self
            .atr_multiplier
            .checked_mul(volatility)
            .ok_or_else(overflow)?;
        if risk_per_unit <= Decimal::ZERO {
            return Err(SizingError::DegenerateVolatility(volatility));
        }

        let units = risk_amount.checked_div(risk_per_unit).ok_or_else(overflow)?;
        let notional = units.checked_mul(price).ok_or_else(overflow)?;

        Ok(notional.round_dp(Self::NOTIONAL_DP).max(Decimal::ZERO))
    }
}
