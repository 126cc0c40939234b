//! Position state machine.
//!
//! Drives FLAT → LONG on a BUY signal and LONG → FLAT when the take-profit
//! or trailing stop is crossed. Every broker call is bounded by a timeout;
//! state only changes after the broker call that justifies it succeeds.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};
use trailbot_core::error::{BrokerError, TradingError};
use trailbot_core::traits::Broker;
use trailbot_core::types::{OrderRequest, Side, Signal, TimeInForce};
use trailbot_risk::{ExitCheck, ExitReason, ExitRules, RiskParameters, VolatilitySizer};
use uuid::Uuid;

use crate::state::PositionState;

/// What one step of the machine did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transition {
    /// Bought `notional` and went long at `price`
    Entered {
        price: Decimal,
        notional: Decimal,
        order_id: Uuid,
    },
    /// BUY signal, but the sized notional was zero
    EntrySkipped { price: Decimal },
    /// Flat and no BUY signal
    Idle,
    /// Long and neither threshold crossed
    Held { check: ExitCheck },
    /// Sold the broker-reported quantity and went flat
    Exited {
        reason: ExitReason,
        price: Decimal,
        quantity: Decimal,
        order_id: Uuid,
    },
    /// The broker held no position; went flat without an order
    ExitedMissing { reason: ExitReason },
}

/// Bound a broker call; expiry counts as the gateway being unavailable.
async fn bounded<T, F>(limit: Duration, op: &str, fut: F) -> Result<T, BrokerError>
where
    F: Future<Output = Result<T, BrokerError>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| BrokerError::Unavailable(format!("{} timed out after {:?}", op, limit)))?
}

/// Owns the position state for one symbol.
///
/// Steps take `&mut self`, so two cycles can never mutate the same state
/// concurrently.
#[derive(Debug, Clone)]
pub struct PositionStateMachine {
    symbol: String,
    state: PositionState,
    sizer: VolatilitySizer,
    exits: ExitRules,
    time_in_force: TimeInForce,
    call_timeout: Duration,
}

impl PositionStateMachine {
    /// Create a flat machine for `symbol`.
    pub fn new(symbol: impl Into<String>, risk: &RiskParameters) -> Self {
        Self {
            symbol: symbol.into(),
            state: PositionState::Flat,
            sizer: VolatilitySizer::from_params(risk),
            exits: ExitRules::from_params(risk),
            time_in_force: TimeInForce::GTC,
            call_timeout: Duration::from_secs(30),
        }
    }

    /// Set the time in force for submitted orders.
    pub fn with_time_in_force(mut self, tif: TimeInForce) -> Self {
        self.time_in_force = tif;
        self
    }

    /// Set the timeout applied to each broker call.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Start from a known state.
    pub fn with_state(mut self, state: PositionState) -> Self {
        self.state = state;
        self
    }

    /// Get the current state.
    pub fn state(&self) -> PositionState {
        self.state
    }

    /// Get the traded symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Adopt whatever the broker already holds for the symbol.
    ///
    /// A held position becomes LONG at its average entry price, with the
    /// high-water mark at the better of entry and the broker's mark. No
    /// position means FLAT.
    ///
    /// # Errors
    /// Any position query failure other than `PositionNotFound`; the state
    /// is left unchanged.
    pub async fn reconcile<B>(&mut self, broker: &B) -> Result<PositionState, TradingError>
    where
        B: Broker + ?Sized,
    {
        let state = match bounded(
            self.call_timeout,
            "position query",
            broker.get_position(&self.symbol),
        )
        .await
        {
            Ok(position) if position.quantity > Decimal::ZERO => {
                let state = PositionState::Long {
                    entry_price: position.avg_entry_price,
                    highest_price: position.avg_entry_price.max(position.current_price),
                };
                info!(
                    symbol = %self.symbol,
                    quantity = %position.quantity,
                    %state,
                    "Resuming position held at broker"
                );
                state
            }
            Ok(_) | Err(BrokerError::PositionNotFound(_)) => {
                info!(symbol = %self.symbol, "No position held at broker, starting flat");
                PositionState::Flat
            }
            Err(e) => return Err(e.into()),
        };

        self.state = state;
        Ok(state)
    }

    /// Apply one cycle's signal, price and volatility.
    ///
    /// # Errors
    /// Sizing and broker failures are returned after leaving the state as it
    /// was, except that a long position keeps its raised high-water mark.
    pub async fn step<B>(
        &mut self,
        broker: &B,
        signal: Signal,
        price: Decimal,
        volatility: Decimal,
    ) -> Result<Transition, TradingError>
    where
        B: Broker + ?Sized,
    {
        match self.state {
            PositionState::Flat if signal.is_buy() => self.enter(broker, price, volatility).await,
            PositionState::Flat => Ok(Transition::Idle),
            PositionState::Long {
                entry_price,
                highest_price,
            } => {
                self.state.observe(price);
                let highest = highest_price.max(price);
                let check = self.exits.evaluate(entry_price, highest, price);

                match check.reason {
                    Some(reason) => self.exit(broker, reason, price).await,
                    None => {
                        debug!(
                            symbol = %self.symbol,
                            %price,
                            take_profit = %check.take_profit_price,
                            stop = %check.stop_price,
                            "Holding position"
                        );
                        Ok(Transition::Held { check })
                    }
                }
            }
        }
    }

    async fn enter<B>(
        &mut self,
        broker: &B,
        price: Decimal,
        volatility: Decimal,
    ) -> Result<Transition, TradingError>
    where
        B: Broker + ?Sized,
    {
        let equity = bounded(self.call_timeout, "equity query", broker.get_equity()).await?;
        let notional = self.sizer.size(equity, price, volatility)?;

        if notional <= Decimal::ZERO || price <= Decimal::ZERO {
            warn!(symbol = %self.symbol, %equity, %price, "Entry sized to zero, skipping");
            return Ok(Transition::EntrySkipped { price });
        }

        let request = OrderRequest::market_notional(&self.symbol, Side::Buy, notional)
            .with_time_in_force(self.time_in_force)
            .with_client_order_id(Uuid::new_v4().to_string());

        let order = bounded(self.call_timeout, "buy order", broker.submit_order(request)).await?;

        self.state = PositionState::long_at(price);
        info!(
            symbol = %self.symbol,
            %price,
            %notional,
            order_id = %order.id,
            "Entered long position"
        );

        Ok(Transition::Entered {
            price,
            notional,
            order_id: order.id,
        })
    }

    async fn exit<B>(
        &mut self,
        broker: &B,
        reason: ExitReason,
        price: Decimal,
    ) -> Result<Transition, TradingError>
    where
        B: Broker + ?Sized,
    {
        let position = match bounded(
            self.call_timeout,
            "position query",
            broker.get_position(&self.symbol),
        )
        .await
        {
            Ok(position) if position.quantity > Decimal::ZERO => position,
            Ok(_) | Err(BrokerError::PositionNotFound(_)) => {
                warn!(
                    symbol = %self.symbol,
                    %reason,
                    "No open position at broker, treating as already closed"
                );
                self.state = PositionState::Flat;
                return Ok(Transition::ExitedMissing { reason });
            }
            Err(e) => return Err(e.into()),
        };

        let request = OrderRequest::market_quantity(&self.symbol, Side::Sell, position.quantity)
            .with_time_in_force(self.time_in_force)
            .with_client_order_id(Uuid::new_v4().to_string());

        let order = bounded(self.call_timeout, "sell order", broker.submit_order(request)).await?;

        self.state = PositionState::Flat;
        info!(
            symbol = %self.symbol,
            %reason,
            %price,
            quantity = %position.quantity,
            order_id = %order.id,
            "Closed position"
        );

        Ok(Transition::Exited {
            reason,
            price,
            quantity: position.quantity,
            order_id: order.id,
        })
    }
}
