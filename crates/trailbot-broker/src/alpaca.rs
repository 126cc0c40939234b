//! Alpaca broker integration for paper and live trading.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{header, Client, Response, StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use trailbot_core::error::BrokerError;
use trailbot_core::traits::Broker;
use trailbot_core::types::{Order, OrderAmount, OrderRequest, OrderStatus, Portfolio, Position, Side};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Alpaca API configuration.
#[derive(Debug, Clone)]
pub struct AlpacaConfig {
    pub api_key: String,
    pub api_secret: String,
    pub paper: bool,
    /// Per-request timeout
    pub timeout: Duration,
}

impl AlpacaConfig {
    /// Create config directly with key and secret.
    pub fn new(api_key: String, api_secret: String, paper: bool) -> Self {
        Self {
            api_key,
            api_secret,
            paper,
            timeout: Duration::from_secs(30),
        }
    }

    /// Load credentials from the named environment variables.
    pub fn from_env_vars(key_var: &str, secret_var: &str, paper: bool) -> Result<Self, BrokerError> {
        let api_key = std::env::var(key_var)
            .map_err(|_| BrokerError::Configuration(format!("{} not set", key_var)))?;
        let api_secret = std::env::var(secret_var)
            .map_err(|_| BrokerError::Configuration(format!("{} not set", secret_var)))?;

        Ok(Self::new(api_key, api_secret, paper))
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        if self.paper {
            "https://paper-api.alpaca.markets"
        } else {
            "https://api.alpaca.markets"
        }
    }

    /// Build an HTTP client carrying the credential headers.
    pub fn http_client(&self) -> Result<Client, BrokerError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            "APCA-API-KEY-ID",
            header::HeaderValue::from_str(&self.api_key)
                .map_err(|e| BrokerError::Configuration(e.to_string()))?,
        );
        headers.insert(
            "APCA-API-SECRET-KEY",
            header::HeaderValue::from_str(&self.api_secret)
                .map_err(|e| BrokerError::Configuration(e.to_string()))?,
        );

        Client::builder()
            .default_headers(headers)
            .timeout(self.timeout)
            .build()
            .map_err(|e| BrokerError::Configuration(e.to_string()))
    }
}

/// Alpaca API response types
#[derive(Debug, Deserialize)]
struct AlpacaAccount {
    cash: String,
    equity: String,
}

#[derive(Debug, Deserialize)]
struct AlpacaPosition {
    symbol: String,
    qty: String,
    avg_entry_price: String,
    #[serde(default)]
    current_price: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AlpacaOrder {
    id: String,
    client_order_id: String,
    status: String,
    symbol: String,
    #[serde(default)]
    qty: Option<String>,
    #[serde(default)]
    notional: Option<String>,
    filled_qty: String,
    side: String,
    filled_avg_price: Option<String>,
    created_at: String,
    filled_at: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateOrderRequest {
    symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    qty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notional: Option<String>,
    side: &'static str,
    #[serde(rename = "type")]
    order_type: &'static str,
    time_in_force: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    client_order_id: Option<String>,
}

/// Alpaca position endpoints want crypto pairs without the slash.
fn position_symbol(symbol: &str) -> String {
    symbol.replace('/', "")
}

fn parse_decimal(field: &str, value: &str) -> Result<Decimal, BrokerError> {
    value
        .parse()
        .map_err(|_| BrokerError::ApiError(format!("invalid {}: {:?}", field, value)))
}

fn parse_time(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn map_transport(e: reqwest::Error) -> BrokerError {
    if e.is_timeout() {
        BrokerError::Unavailable(format!("request timed out: {}", e))
    } else {
        BrokerError::Unavailable(e.to_string())
    }
}

/// Map a non-success status to the broker error taxonomy.
fn status_error(status: StatusCode, body: String) -> BrokerError {
    let detail = format!("{}: {}", status, body);
    match status {
        StatusCode::UNAUTHORIZED => BrokerError::AuthenticationError(detail),
        StatusCode::FORBIDDEN | StatusCode::UNPROCESSABLE_ENTITY => {
            BrokerError::OrderRejected(detail)
        }
        StatusCode::TOO_MANY_REQUESTS => BrokerError::RateLimited {
            retry_after_secs: 60,
        },
        s if s.is_server_error() => BrokerError::Unavailable(detail),
        _ => BrokerError::ApiError(detail),
    }
}

async fn check(resp: Response) -> Result<Response, BrokerError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    Err(status_error(status, text))
}

fn parse_status(status: &str) -> OrderStatus {
    match status {
        "partially_filled" => OrderStatus::PartiallyFilled,
        "filled" => OrderStatus::Filled,
        "canceled" | "expired" | "rejected" | "done_for_day" => OrderStatus::Canceled,
        _ => OrderStatus::Pending,
    }
}

fn parse_order(order: AlpacaOrder) -> Result<Order, BrokerError> {
    let id = Uuid::parse_str(&order.id)
        .map_err(|_| BrokerError::ApiError(format!("invalid order id: {}", order.id)))?;

    let side = match order.side.as_str() {
        "buy" => Side::Buy,
        "sell" => Side::Sell,
        _ => return Err(BrokerError::ApiError(format!("Unknown side: {}", order.side))),
    };

    let amount = match (&order.qty, &order.notional) {
        (Some(qty), _) => OrderAmount::Quantity(parse_decimal("qty", qty)?),
        (None, Some(notional)) => OrderAmount::Notional(parse_decimal("notional", notional)?),
        (None, None) => return Err(BrokerError::ApiError("order has neither qty nor notional".into())),
    };

    let filled_avg_price = order
        .filled_avg_price
        .as_deref()
        .map(|p| parse_decimal("filled_avg_price", p))
        .transpose()?;

    Ok(Order {
        id,
        client_order_id: order.client_order_id,
        symbol: order.symbol,
        side,
        amount,
        time_in_force: Default::default(),
        status: parse_status(&order.status),
        filled_quantity: parse_decimal("filled_qty", &order.filled_qty)?,
        filled_avg_price,
        created_at: parse_time(&order.created_at).unwrap_or_else(Utc::now),
        filled_at: order.filled_at.as_deref().and_then(parse_time),
    })
}

/// Build the order record for a submission Alpaca accepted.
///
/// The order exists at the broker once the status is 2xx, so a body that
/// fails to decode falls back to the request instead of failing the call.
fn accepted_order(request: &OrderRequest, body: &str) -> Order {
    let parsed = serde_json::from_str::<AlpacaOrder>(body)
        .map_err(|e| BrokerError::ApiError(e.to_string()))
        .and_then(parse_order);

    match parsed {
        Ok(mut order) => {
            order.time_in_force = request.time_in_force;
            order
        }
        Err(e) => {
            warn!(
                symbol = %request.symbol,
                side = %request.side,
                error = %e,
                "Order accepted but the response did not parse, recording the request"
            );
            Order::from_request(request)
        }
    }
}

fn parse_position(p: AlpacaPosition) -> Result<Position, BrokerError> {
    let quantity = parse_decimal("qty", &p.qty)?;
    let avg_entry_price = parse_decimal("avg_entry_price", &p.avg_entry_price)?;

    let mut position = Position::new(p.symbol, quantity, avg_entry_price);
    if let Some(price) = p.current_price.as_deref() {
        position.update_price(parse_decimal("current_price", price)?);
    }
    Ok(position)
}

fn create_order_body(request: &OrderRequest) -> CreateOrderRequest {
    let (qty, notional) = match request.amount {
        OrderAmount::Quantity(q) => (Some(q.normalize().to_string()), None),
        OrderAmount::Notional(n) => (None, Some(n.round_dp(2).to_string())),
    };

    CreateOrderRequest {
        symbol: request.symbol.clone(),
        qty,
        notional,
        side: match request.side {
            Side::Buy => "buy",
            Side::Sell => "sell",
        },
        order_type: "market",
        time_in_force: request.time_in_force.as_str(),
        client_order_id: request.client_order_id.clone(),
    }
}

/// Alpaca broker client.
pub struct AlpacaBroker {
    config: AlpacaConfig,
    client: Client,
}

impl AlpacaBroker {
    /// Create a new Alpaca broker client.
    pub fn new(config: AlpacaConfig) -> Result<Self, BrokerError> {
        let client = config.http_client()?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl Broker for AlpacaBroker {
    async fn get_account(&self) -> Result<Portfolio, BrokerError> {
        let url = format!("{}/v2/account", self.config.base_url());

        let resp = self.client.get(&url).send().await.map_err(map_transport)?;
        let account: AlpacaAccount = check(resp)
            .await?
            .json()
            .await
            .map_err(|e| BrokerError::ApiError(e.to_string()))?;

        let equity = parse_decimal("equity", &account.equity)?;
        let mut portfolio = Portfolio::new(equity);
        portfolio.cash = parse_decimal("cash", &account.cash)?;

        Ok(portfolio)
    }

    async fn submit_order(&self, request: OrderRequest) -> Result<Order, BrokerError> {
        let url = format!("{}/v2/orders", self.config.base_url());
        let body = create_order_body(&request);

        debug!("Submitting order: {:?}", body);

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(map_transport)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(match status_error(status, text) {
                BrokerError::ApiError(detail) => BrokerError::OrderRejected(detail),
                other => other,
            });
        }

        let text = match resp.text().await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Could not read order response body");
                String::new()
            }
        };
        let order = accepted_order(&request, &text);

        info!(
            order_id = %order.id,
            side = %order.side,
            amount = %order.amount,
            symbol = %order.symbol,
            "Order submitted"
        );
        Ok(order)
    }

    async fn get_position(&self, symbol: &str) -> Result<Position, BrokerError> {
        let url = format!(
            "{}/v2/positions/{}",
            self.config.base_url(),
            position_symbol(symbol)
        );
        let resp = self.client.get(&url).send().await.map_err(map_transport)?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(BrokerError::PositionNotFound(symbol.to_string()));
        }

        let p: AlpacaPosition = check(resp)
            .await?
            .json()
            .await
            .map_err(|e| BrokerError::ApiError(e.to_string()))?;
        parse_position(p)
    }

    fn name(&self) -> &str {
        if self.config.paper {
            "Alpaca Paper"
        } else {
            "Alpaca Live"
        }
    }
}
