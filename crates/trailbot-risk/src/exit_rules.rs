//! Take-profit and trailing-stop exit rules for a long position.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::RiskParameters;

/// Why a long position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// Price reached the fixed target above the entry price
    TakeProfit,
    /// Price fell back from the high-water mark
    TrailingStop,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::TakeProfit => write!(f, "take-profit"),
            ExitReason::TrailingStop => write!(f, "trailing-stop"),
        }
    }
}

/// Thresholds for one cycle and the exit they call for, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitCheck {
    /// Fixed target: `entry * (1 + take_profit_fraction)`
    pub take_profit_price: Decimal,
    /// Trailing floor: `highest * (1 - trailing_stop_fraction)`
    pub stop_price: Decimal,
    /// Triggered exit; take-profit wins when both thresholds are crossed
    pub reason: Option<ExitReason>,
}

/// Evaluates exits for a long position.
///
/// The take-profit target is anchored to the entry price and never moves.
/// The stop trails the highest price seen since entry.
#[derive(Debug, Clone, Copy)]
pub struct ExitRules {
    take_profit_fraction: Decimal,
    trailing_stop_fraction: Decimal,
}

impl ExitRules {
    /// Create exit rules.
    pub fn new(take_profit_fraction: Decimal, trailing_stop_fraction: Decimal) -> Self {
        Self {
            take_profit_fraction,
            trailing_stop_fraction,
        }
    }

    /// Create exit rules from the run's risk parameters.
    pub fn from_params(params: &RiskParameters) -> Self {
        Self::new(params.take_profit_fraction, params.trailing_stop_fraction)
    }

    /// Calculate the take-profit price for an entry.
    pub fn take_profit_price(&self, entry_price: Decimal) -> Decimal {
        entry_price * (Decimal::ONE + self.take_profit_fraction)
    }

    /// Calculate the stop price for a high-water mark.
    pub fn stop_price(&self, highest_price: Decimal) -> Decimal {
        highest_price * (Decimal::ONE - self.trailing_stop_fraction)
    }

    /// Evaluate both thresholds, then apply precedence.
    ///
    /// `highest_price` must already include `current_price`.
    pub fn evaluate(
        &self,
        entry_price: Decimal,
        highest_price: Decimal,
        current_price: Decimal,
    ) -> ExitCheck {
        let take_profit_price = self.take_profit_price(entry_price);
        let stop_price = self.stop_price(highest_price);

        let take_profit_hit = current_price >= take_profit_price;
        let stop_hit = current_price <= stop_price;

        let reason = match (take_profit_hit, stop_hit) {
            (true, _) => Some(ExitReason::TakeProfit),
            (false, true) => Some(ExitReason::TrailingStop),
            (false, false) => None,
        };

        ExitCheck {
            take_profit_price,
            stop_price,
            reason,
        }
    }
}
