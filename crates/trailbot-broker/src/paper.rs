//! Paper trading broker for replay and simulation.

use async_trait::async_trait;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};
use trailbot_core::error::BrokerError;
use trailbot_core::traits::Broker;
use trailbot_core::types::{Order, OrderAmount, OrderRequest, Portfolio, Position, Side};

/// Quantity precision for fractional crypto fills.
const QUANTITY_DP: u32 = 9;

/// Paper trading broker for simulation.
///
/// Market orders fill immediately at the last marked price, adjusted for
/// slippage against the taker. A notional buy larger than the cash on hand
/// fills as much as the cash covers; quantity orders must be fully funded.
#[derive(Clone)]
pub struct PaperBroker {
    portfolio: Arc<Mutex<Portfolio>>,
    prices: Arc<Mutex<HashMap<String, Decimal>>>,
    orders: Arc<Mutex<Vec<Order>>>,
    slippage_pct: Decimal,
    commission_pct: Decimal,
}

impl PaperBroker {
    /// Create a new paper broker with initial capital.
    pub fn new(initial_capital: Decimal) -> Self {
        Self {
            portfolio: Arc::new(Mutex::new(Portfolio::new(initial_capital))),
            prices: Arc::new(Mutex::new(HashMap::new())),
            orders: Arc::new(Mutex::new(Vec::new())),
            slippage_pct: dec!(0.05), // 0.05% slippage
            commission_pct: Decimal::ZERO,
        }
    }

    /// Set slippage percentage.
    pub fn with_slippage(mut self, slippage_pct: Decimal) -> Self {
        self.slippage_pct = slippage_pct;
        self
    }

    /// Set commission as a percentage of fill value.
    pub fn with_commission(mut self, commission_pct: Decimal) -> Self {
        self.commission_pct = commission_pct;
        self
    }

    /// Get a snapshot of the portfolio.
    pub fn portfolio_snapshot(&self) -> Result<Portfolio, BrokerError> {
        Ok(self.lock_portfolio()?.clone())
    }

    /// Get every order filled so far, oldest first.
    pub fn order_history(&self) -> Result<Vec<Order>, BrokerError> {
        self.orders
            .lock()
            .map(|orders| orders.clone())
            .map_err(|_| BrokerError::ApiError("order book lock poisoned".into()))
    }

    fn lock_portfolio(&self) -> Result<MutexGuard<'_, Portfolio>, BrokerError> {
        self.portfolio
            .lock()
            .map_err(|_| BrokerError::ApiError("portfolio lock poisoned".into()))
    }

    fn last_price(&self, symbol: &str) -> Result<Decimal, BrokerError> {
        let prices = self
            .prices
            .lock()
            .map_err(|_| BrokerError::ApiError("price lock poisoned".into()))?;
        prices
            .get(symbol)
            .copied()
            .ok_or_else(|| BrokerError::OrderRejected(format!("no market price for {}", symbol)))
    }

    /// Largest notional the cash covers once commission is added.
    fn buying_power(&self) -> Result<Decimal, BrokerError> {
        let cash = self.lock_portfolio()?.cash;
        Ok((cash / (dec!(1) + self.commission_pct / dec!(100))).max(Decimal::ZERO))
    }

    fn fill_price(&self, side: Side, market_price: Decimal) -> Decimal {
        match side {
            Side::Buy => market_price * (dec!(1) + self.slippage_pct / dec!(100)),
            Side::Sell => market_price * (dec!(1) - self.slippage_pct / dec!(100)),
        }
    }

    /// Execute a market order against the portfolio.
    fn execute(&self, request: &OrderRequest, market_price: Decimal) -> Result<Order, BrokerError> {
        let fill_price = self.fill_price(request.side, market_price);
        if fill_price <= Decimal::ZERO {
            return Err(BrokerError::OrderRejected(format!(
                "cannot fill at price {}",
                fill_price
            )));
        }

        let quantity = match request.amount {
            OrderAmount::Quantity(qty) => qty,
            OrderAmount::Notional(notional) => {
                let notional = match request.side {
                    Side::Buy => {
                        let available = self.buying_power()?;
                        if notional > available {
                            warn!(
                                symbol = %request.symbol,
                                requested = %notional,
                                %available,
                                "Notional exceeds buying power, filling what cash covers"
                            );
                        }
                        notional.min(available)
                    }
                    Side::Sell => notional,
                };
                (notional / fill_price).round_dp_with_strategy(QUANTITY_DP, RoundingStrategy::ToZero)
            }
        };
        if quantity <= Decimal::ZERO {
            return Err(BrokerError::OrderRejected(format!(
                "order amount {} is below the minimum",
                request.amount
            )));
        }

        let fill_value = fill_price * quantity;
        let commission = fill_value * self.commission_pct / dec!(100);

        let mut portfolio = self.lock_portfolio()?;
        match request.side {
            Side::Buy => {
                let required = fill_value + commission;
                if required > portfolio.cash {
                    return Err(BrokerError::InsufficientFunds {
                        required,
                        available: portfolio.cash,
                    });
                }
                portfolio.cash -= required;
            }
            Side::Sell => {
                let held = portfolio
                    .positions
                    .get(&request.symbol)
                    .map(|p| p.quantity)
                    .unwrap_or_default();
                if quantity > held {
                    return Err(BrokerError::OrderRejected(format!(
                        "sell quantity {} exceeds position {}",
                        quantity, held
                    )));
                }
                portfolio.cash += fill_value - commission;
            }
        }

        let position = portfolio
            .positions
            .entry(request.symbol.clone())
            .or_insert_with(|| Position::new(&request.symbol, Decimal::ZERO, Decimal::ZERO));
        let realized = position.apply_fill(request.side, quantity, fill_price);
        position.update_price(market_price);
        let flat = position.is_flat();

        if flat {
            portfolio.positions.remove(&request.symbol);
        }
        portfolio.total_realized_pnl += realized - commission;
        portfolio.update_equity();

        let mut order = Order::from_request(request);
        order.fill(quantity, fill_price);

        debug!(
            symbol = %order.symbol,
            side = %order.side,
            quantity = %quantity,
            price = %fill_price,
            value = ?order.value(),
            "Paper fill"
        );

        Ok(order)
    }
}

#[async_trait]
impl Broker for PaperBroker {
    async fn get_account(&self) -> Result<Portfolio, BrokerError> {
        self.portfolio_snapshot()
    }

    async fn submit_order(&self, request: OrderRequest) -> Result<Order, BrokerError> {
        if !request.amount.is_positive() {
            return Err(BrokerError::OrderRejected(format!(
                "order amount must be positive, got {}",
                request.amount
            )));
        }

        let market_price = self.last_price(&request.symbol)?;
        let order = self.execute(&request, market_price)?;

        self.orders
            .lock()
            .map_err(|_| BrokerError::ApiError("order book lock poisoned".into()))?
            .push(order.clone());

        Ok(order)
    }

    async fn get_position(&self, symbol: &str) -> Result<Position, BrokerError> {
        let portfolio = self.lock_portfolio()?;
        portfolio
            .positions
            .get(symbol)
            .cloned()
            .ok_or_else(|| BrokerError::PositionNotFound(symbol.to_string()))
    }

    fn mark_price(&self, symbol: &str, price: Decimal) {
        if let Ok(mut prices) = self.prices.lock() {
            prices.insert(symbol.to_string(), price);
        }
        if let Ok(mut portfolio) = self.portfolio.lock() {
            if let Some(position) = portfolio.positions.get_mut(symbol) {
                position.update_price(price);
            }
            portfolio.update_equity();
        }
    }

    fn name(&self) -> &str {
        "Paper Broker"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn broker() -> PaperBroker {
        PaperBroker::new(dec!(10000)).with_slippage(Decimal::ZERO)
    }

    #[tokio::test]
    async fn test_paper_broker_notional_buy() {
        let broker = broker();
        broker.mark_price("ETH/USD", dec!(2000));

        let request = OrderRequest::market_notional("ETH/USD", Side::Buy, dec!(5000));
        let order = broker.submit_order(request).await.unwrap();

        assert!(order.is_filled());
        assert_eq!(order.filled_quantity, dec!(2.5));

        let position = broker.get_position("ETH/USD").await.unwrap();
        assert_eq!(position.quantity, dec!(2.5));

        let account = broker.get_account().await.unwrap();
        assert_eq!(account.cash, dec!(5000));
        assert_eq!(account.equity, dec!(10000));
    }

    #[tokio::test]
    async fn test_paper_broker_close_position() {
        let broker = broker();
        broker.mark_price("ETH/USD", dec!(2000));
        broker
            .submit_order(OrderRequest::market_notional("ETH/USD", Side::Buy, dec!(4000)))
            .await
            .unwrap();

        broker.mark_price("ETH/USD", dec!(2200));
        let held = broker.get_position("ETH/USD").await.unwrap().quantity;
        broker
            .submit_order(OrderRequest::market_quantity("ETH/USD", Side::Sell, held))
            .await
            .unwrap();

        // Position closed
        assert!(matches!(
            broker.get_position("ETH/USD").await,
            Err(BrokerError::PositionNotFound(_))
        ));

        let account = broker.get_account().await.unwrap();
        assert_eq!(account.cash, dec!(10400));
        assert_eq!(account.total_realized_pnl, dec!(400));
        assert_eq!(broker.order_history().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_mark_price_updates_equity() {
        let broker = broker();
        broker.mark_price("ETH/USD", dec!(100));
        broker
            .submit_order(OrderRequest::market_quantity("ETH/USD", Side::Buy, dec!(10)))
            .await
            .unwrap();

        broker.mark_price("ETH/USD", dec!(110));
        assert_eq!(broker.get_equity().await.unwrap(), dec!(10100));
    }

    #[tokio::test]
    async fn test_oversized_notional_fills_buying_power() {
        let broker = broker();
        broker.mark_price("ETH/USD", dec!(2000));

        let request = OrderRequest::market_notional("ETH/USD", Side::Buy, dec!(26666.67));
        let order = broker.submit_order(request).await.unwrap();

        assert_eq!(order.filled_quantity, dec!(5));
        let account = broker.get_account().await.unwrap();
        assert_eq!(account.cash, Decimal::ZERO);
        assert_eq!(account.equity, dec!(10000));
    }

    #[tokio::test]
    async fn test_buying_power_covers_commission() {
        let broker = broker().with_commission(dec!(1));
        broker.mark_price("ETH/USD", dec!(100));

        broker
            .submit_order(OrderRequest::market_notional("ETH/USD", Side::Buy, dec!(50000)))
            .await
            .unwrap();

        let account = broker.get_account().await.unwrap();
        assert!(account.cash >= Decimal::ZERO);
        assert!(account.cash < dec!(1));
    }

    #[tokio::test]
    async fn test_insufficient_funds_for_quantity() {
        let broker = broker();
        broker.mark_price("ETH/USD", dec!(2000));

        let request = OrderRequest::market_quantity("ETH/USD", Side::Buy, dec!(6));
        assert!(matches!(
            broker.submit_order(request).await,
            Err(BrokerError::InsufficientFunds { .. })
        ));
        // Nothing was recorded
        assert!(broker.order_history().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unpriced_symbol_rejected() {
        let broker = broker();
        let request = OrderRequest::market_notional("BTC/USD", Side::Buy, dec!(100));
        assert!(matches!(
            broker.submit_order(request).await,
            Err(BrokerError::OrderRejected(_))
        ));
    }

    #[tokio::test]
    async fn test_slippage_against_taker() {
        let broker = PaperBroker::new(dec!(10000)).with_slippage(dec!(1));
        broker.mark_price("ETH/USD", dec!(100));

        let order = broker
            .submit_order(OrderRequest::market_quantity("ETH/USD", Side::Buy, dec!(1)))
            .await
            .unwrap();
        assert_eq!(order.filled_avg_price, Some(dec!(101)));
    }
}
