//! Risk management for the trading loop.
//!
//! Provides volatility-scaled position sizing and the take-profit /
//! trailing-stop exit rules.

mod exit_rules;
mod params;
mod position_sizer;

pub use exit_rules::{ExitCheck, ExitReason, ExitRules};
pub use params::RiskParameters;
pub use position_sizer::VolatilitySizer;
