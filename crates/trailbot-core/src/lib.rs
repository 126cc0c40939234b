//! Core types and traits for the trading loop.
//!
//! This crate provides the foundational building blocks including:
//! - Market data types (Bar, EnrichedBar, BarInterval)
//! - Order, position and account types
//! - The discrete trading signal
//! - Traits for indicators, signal generators, brokers, and bar sources

pub mod types;
pub mod traits;
pub mod error;

pub use error::{Disposition, TradingError};
pub use types::*;
pub use traits::*;
