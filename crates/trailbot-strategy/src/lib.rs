//! Signal generation.
//!
//! This crate turns the newest enriched bar into a discrete signal:
//! - Trend + momentum confirmation (short/long SMA with RSI)

mod trend_momentum;

pub use trend_momentum::TrendMomentum;
