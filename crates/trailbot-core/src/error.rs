//! Error types for the trading loop.

use thiserror::Error;

/// Top-level trading error.
#[derive(Error, Debug)]
pub enum TradingError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Broker error: {0}")]
    Broker(#[from] BrokerError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Indicator error: {0}")]
    Indicator(#[from] IndicatorError),

    #[error("Sizing error: {0}")]
    Sizing(#[from] SizingError),
}

/// How the decision loop recovers from an error raised inside one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Not enough usable market data; nothing was attempted this cycle.
    SkipCycle,
    /// The entry could not be sized; the position stays flat until the next cycle.
    SkipEntry,
    /// A transient gateway failure; state is unchanged and the next cycle retries.
    Retry,
    /// Not recoverable by waiting; the loop should stop.
    Fatal,
}

impl TradingError {
    /// Classify the error for the cycle boundary.
    pub fn disposition(&self) -> Disposition {
        match self {
            TradingError::Indicator(IndicatorError::InvalidParameter(_)) => Disposition::Fatal,
            TradingError::Indicator(_) => Disposition::SkipCycle,
            TradingError::Data(e) if e.is_transient() => Disposition::Retry,
            TradingError::Data(_) => Disposition::SkipCycle,
            TradingError::Sizing(_) => Disposition::SkipEntry,
            TradingError::Broker(e) if e.is_transient() => Disposition::Retry,
            TradingError::Broker(_) => Disposition::Fatal,
            TradingError::Config(_) => Disposition::Fatal,
        }
    }
}

/// Broker-specific errors.
#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Gateway unavailable: {0}")]
    Unavailable(String),

    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Order rejected: {0}")]
    OrderRejected(String),

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        required: rust_decimal::Decimal,
        available: rust_decimal::Decimal,
    },

    #[error("Position not found: {0}")]
    PositionNotFound(String),

    #[error("Rate limited: retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    #[error("API error: {0}")]
    ApiError(String),
}

impl BrokerError {
    /// Whether waiting for the next cycle can clear this error.
    ///
    /// Rejections are retried too: a later cycle sees a fresh price and equity.
    pub fn is_transient(&self) -> bool {
        !matches!(
            self,
            BrokerError::Configuration(_) | BrokerError::AuthenticationError(_)
        )
    }
}

/// Data source errors.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("No data available for the requested range")]
    NoDataAvailable,

    #[error("Bars out of order: timestamp {timestamp} does not follow {previous}")]
    OutOfOrder { previous: i64, timestamp: i64 },

    #[error("Invalid bar interval: {0}")]
    InvalidInterval(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl DataError {
    /// Whether the failure came from the transport rather than the data itself.
    pub fn is_transient(&self) -> bool {
        matches!(self, DataError::ConnectionError(_) | DataError::Timeout(_))
    }
}

/// Indicator calculation errors.
#[derive(Error, Debug)]
pub enum IndicatorError {
    #[error("Insufficient data: need {required} bars, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Position sizing errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SizingError {
    #[error("Cannot size against volatility {0}")]
    DegenerateVolatility(rust_decimal::Decimal),

    #[error("Invalid sizing input: {0}")]
    InvalidInput(String),
}
