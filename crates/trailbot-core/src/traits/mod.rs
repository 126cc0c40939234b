//! Core traits for the trading loop.

mod broker;
mod data_source;
mod indicator;
mod strategy;

pub use broker::Broker;
pub use data_source::BarSource;
pub use indicator::{BarIndicator, Indicator};
pub use strategy::SignalGenerator;
