//! Core data types for the trading loop.

mod interval;
mod ohlcv;
mod order;
mod position;
mod signal;

pub use interval::BarInterval;
pub use ohlcv::{validate_series, Bar, EnrichedBar};
pub use order::{Order, OrderAmount, OrderRequest, OrderStatus, Side, TimeInForce};
pub use position::{Portfolio, Position};
pub use signal::Signal;
