//! Broker integrations.
//!
//! - [`AlpacaBroker`]: Alpaca REST trading API, paper or live endpoint
//! - [`PaperBroker`]: in-memory account that fills at the last marked price

mod alpaca;
mod paper;

pub use alpaca::{AlpacaBroker, AlpacaConfig};
pub use paper::PaperBroker;
