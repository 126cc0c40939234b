//! Broker trait definition.

use crate::error::BrokerError;
use crate::types::{Order, OrderRequest, Portfolio, Position};
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Execution gateway.
///
/// Brokers report account equity, accept market orders and report the
/// open position for a symbol. Implementations must be safe to query from
/// several tasks; order submission for one symbol is serialized by the caller.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Get account/portfolio information.
    async fn get_account(&self) -> Result<Portfolio, BrokerError>;

    /// Submit a new market order.
    ///
    /// # Arguments
    /// * `request` - The order request to submit
    ///
    /// # Returns
    /// The acknowledged order with an ID and initial status
    async fn submit_order(&self, request: OrderRequest) -> Result<Order, BrokerError>;

    /// Get the open position for a symbol.
    ///
    /// # Errors
    /// `BrokerError::PositionNotFound` when nothing is held.
    async fn get_position(&self, symbol: &str) -> Result<Position, BrokerError>;

    /// Get the current account equity.
    async fn get_equity(&self) -> Result<Decimal, BrokerError> {
        let account = self.get_account().await?;
        Ok(account.equity)
    }

    /// Record the latest observed price for a symbol.
    ///
    /// Simulated brokers fill market orders at this price. Real brokers
    /// price from their own feeds and ignore it.
    fn mark_price(&self, _symbol: &str, _price: Decimal) {}

    /// Get the broker name.
    fn name(&self) -> &str;
}
