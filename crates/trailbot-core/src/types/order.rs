//! Order types and structures.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Order side (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Time in force for orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimeInForce {
    /// Valid for the trading day only
    Day,
    /// Good til canceled
    #[default]
    #[serde(rename = "gtc")]
    GTC,
    /// Immediate or cancel
    #[serde(rename = "ioc")]
    IOC,
    /// Fill or kill
    #[serde(rename = "fok")]
    FOK,
}

impl TimeInForce {
    /// Wire name used by the broker API.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeInForce::Day => "day",
            TimeInForce::GTC => "gtc",
            TimeInForce::IOC => "ioc",
            TimeInForce::FOK => "fok",
        }
    }
}

/// How much a market order should trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderAmount {
    /// Currency value; the broker works out the quantity at fill time
    Notional(Decimal),
    /// Base-asset units
    Quantity(Decimal),
}

impl OrderAmount {
    /// Check the amount is strictly positive.
    pub fn is_positive(&self) -> bool {
        match self {
            OrderAmount::Notional(v) | OrderAmount::Quantity(v) => *v > Decimal::ZERO,
        }
    }
}

impl std::fmt::Display for OrderAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderAmount::Notional(v) => write!(f, "${}", v),
            OrderAmount::Quantity(v) => write!(f, "{} units", v),
        }
    }
}

/// Order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order accepted by the broker, not yet filled
    Pending,
    /// Order partially filled
    PartiallyFilled,
    /// Order completely filled
    Filled,
    /// Order canceled, expired or rejected after acceptance
    Canceled,
}

/// Market order request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Symbol to trade
    pub symbol: String,
    /// Buy or sell
    pub side: Side,
    /// Notional or quantity
    pub amount: OrderAmount,
    /// Time in force
    pub time_in_force: TimeInForce,
    /// Client-provided order ID
    pub client_order_id: Option<String>,
}

impl OrderRequest {
    /// Create a market order for a currency amount.
    pub fn market_notional(symbol: impl Into<String>, side: Side, notional: Decimal) -> Self {
        Self::market(symbol, side, OrderAmount::Notional(notional))
    }

    /// Create a market order for a quantity of the base asset.
    pub fn market_quantity(symbol: impl Into<String>, side: Side, quantity: Decimal) -> Self {
        Self::market(symbol, side, OrderAmount::Quantity(quantity))
    }

    fn market(symbol: impl Into<String>, side: Side, amount: OrderAmount) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            amount,
            time_in_force: TimeInForce::default(),
            client_order_id: None,
        }
    }

    /// Set the time in force.
    pub fn with_time_in_force(mut self, tif: TimeInForce) -> Self {
        self.time_in_force = tif;
        self
    }

    /// Set a client order ID.
    pub fn with_client_order_id(mut self, id: impl Into<String>) -> Self {
        self.client_order_id = Some(id.into());
        self
    }
}

/// Order as acknowledged by the broker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique order ID
    pub id: Uuid,
    /// Client-provided order ID
    pub client_order_id: String,
    /// Symbol traded
    pub symbol: String,
    /// Buy or sell
    pub side: Side,
    /// Requested amount
    pub amount: OrderAmount,
    /// Time in force
    pub time_in_force: TimeInForce,
    /// Current status
    pub status: OrderStatus,
    /// Quantity filled so far
    pub filled_quantity: Decimal,
    /// Average fill price
    pub filled_avg_price: Option<Decimal>,
    /// When the order was created
    pub created_at: DateTime<Utc>,
    /// When the order was filled
    pub filled_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Create a new pending order from a request.
    pub fn from_request(request: &OrderRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            client_order_id: request
                .client_order_id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            symbol: request.symbol.clone(),
            side: request.side,
            amount: request.amount,
            time_in_force: request.time_in_force,
            status: OrderStatus::Pending,
            filled_quantity: Decimal::ZERO,
            filled_avg_price: None,
            created_at: Utc::now(),
            filled_at: None,
        }
    }

    /// Mark the order completely filled.
    pub fn fill(&mut self, quantity: Decimal, price: Decimal) {
        self.filled_quantity = quantity;
        self.filled_avg_price = Some(price);
        self.status = OrderStatus::Filled;
        self.filled_at = Some(Utc::now());
    }

    /// Check if the order is completely filled.
    pub fn is_filled(&self) -> bool {
        self.status == OrderStatus::Filled
    }

    /// Calculate the total value of the filled part.
    pub fn value(&self) -> Option<Decimal> {
        self.filled_avg_price
            .map(|price| price * self.filled_quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_order_request_notional() {
        let request = OrderRequest::market_notional("ETH/USD", Side::Buy, dec!(26666.67));
        assert_eq!(request.symbol, "ETH/USD");
        assert_eq!(request.side, Side::Buy);
        assert_eq!(request.amount, OrderAmount::Notional(dec!(26666.67)));
        assert_eq!(request.time_in_force, TimeInForce::GTC);
    }

    #[test]
    fn test_order_request_quantity() {
        let request = OrderRequest::market_quantity("ETH/USD", Side::Sell, dec!(13.3333))
            .with_time_in_force(TimeInForce::IOC)
            .with_client_order_id("exit-1");
        assert_eq!(request.amount, OrderAmount::Quantity(dec!(13.3333)));
        assert_eq!(request.time_in_force.as_str(), "ioc");
        assert_eq!(request.client_order_id.as_deref(), Some("exit-1"));
    }

    #[test]
    fn test_order_fill() {
        let request = OrderRequest::market_quantity("ETH/USD", Side::Buy, dec!(2));
        let mut order = Order::from_request(&request);
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.value().is_none());

        order.fill(dec!(2), dec!(2000));
        assert!(order.is_filled());
        assert_eq!(order.value(), Some(dec!(4000)));
    }

    #[test]
    fn test_amount_positive() {
        assert!(OrderAmount::Notional(dec!(1)).is_positive());
        assert!(!OrderAmount::Quantity(Decimal::ZERO).is_positive());
        assert_eq!(Side::Sell.to_string(), "SELL");
    }
}
