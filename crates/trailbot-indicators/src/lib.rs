//! Technical indicators and the bar enrichment engine.
//!
//! This crate provides the indicators the trading loop reads:
//! - Simple moving average (trend)
//! - RSI with Wilder smoothing (momentum)
//! - Average true range (volatility)
//!
//! [`IndicatorEngine`] combines them into [`EnrichedBar`](trailbot_core::EnrichedBar)s,
//! dropping every bar that precedes the longest warm-up window.

pub mod engine;
pub mod momentum;
pub mod moving_average;
pub mod volatility;

pub use engine::{IndicatorEngine, IndicatorParams};
pub use momentum::Rsi;
pub use moving_average::Sma;
pub use volatility::Atr;
