//! OHLCV (Open, High, Low, Close, Volume) data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DataError;

/// One OHLCV sample for one time bucket.
/// Uses f64 for fast indicator calculations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Bucket start, Unix timestamp in milliseconds (UTC)
    pub timestamp: i64,
    /// Opening price
    pub open: f64,
    /// Highest price
    pub high: f64,
    /// Lowest price
    pub low: f64,
    /// Closing price
    pub close: f64,
    /// Traded volume
    pub volume: f64,
    /// Number of trades in the bucket
    pub trade_count: u64,
    /// Volume-weighted average price
    pub vwap: f64,
}

impl Bar {
    /// Create a new bar. VWAP defaults to the typical price.
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            trade_count: 0,
            vwap: (high + low + close) / 3.0,
        }
    }

    /// Set the trade count and VWAP reported by the venue.
    pub fn with_trades(mut self, trade_count: u64, vwap: f64) -> Self {
        self.trade_count = trade_count;
        self.vwap = vwap;
        self
    }

    /// Get the timestamp as a DateTime.
    pub fn datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.timestamp).unwrap_or_default()
    }

    /// Calculate the true range (used for ATR).
    #[inline]
    pub fn true_range(&self, prev_close: Option<f64>) -> f64 {
        match prev_close {
            Some(pc) => {
                let hl = self.high - self.low;
                let hc = (self.high - pc).abs();
                let lc = (self.low - pc).abs();
                hl.max(hc).max(lc)
            }
            None => self.high - self.low,
        }
    }
}

/// A bar with the derived fields the signal generator reads.
///
/// Only produced once every indicator window is warm; there is no partially
/// populated variant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnrichedBar {
    /// The underlying bar
    pub bar: Bar,
    /// Short trend average (SMA of close)
    pub sma_short: f64,
    /// Long trend average (SMA of close)
    pub sma_long: f64,
    /// Momentum oscillator (RSI, 0-100)
    pub rsi: f64,
    /// Volatility (average true range)
    pub atr: f64,
}

impl EnrichedBar {
    /// Closing price of the underlying bar.
    #[inline]
    pub fn close(&self) -> f64 {
        self.bar.close
    }
}

/// Check that timestamps are strictly increasing.
pub fn validate_series(bars: &[Bar]) -> Result<(), DataError> {
    for pair in bars.windows(2) {
        if pair[1].timestamp <= pair[0].timestamp {
            return Err(DataError::OutOfOrder {
                previous: pair[0].timestamp,
                timestamp: pair[1].timestamp,
            });
        }
    }
    Ok(())
}
