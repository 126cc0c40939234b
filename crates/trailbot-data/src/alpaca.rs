//! Alpaca crypto market data.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, SecondsFormat, Utc};
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;
use trailbot_core::error::DataError;
use trailbot_core::traits::BarSource;
use trailbot_core::types::{Bar, BarInterval};

use crate::resample::resample;

const DATA_URL: &str = "https://data.alpaca.markets";
const PAGE_LIMIT: usize = 10_000;

#[derive(Debug, Deserialize)]
struct AlpacaBar {
    t: String,
    o: f64,
    h: f64,
    l: f64,
    c: f64,
    v: f64,
    #[serde(default)]
    n: u64,
    #[serde(default)]
    vw: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct AlpacaBarsResponse {
    #[serde(default)]
    bars: HashMap<String, Vec<AlpacaBar>>,
    next_page_token: Option<String>,
}

impl AlpacaBar {
    fn into_bar(self) -> Result<Bar, DataError> {
        let ts = DateTime::parse_from_rfc3339(&self.t)
            .map(|dt| dt.timestamp_millis())
            .map_err(|e| DataError::ParseError(format!("bar timestamp {:?}: {}", self.t, e)))?;

        let bar = Bar::new(ts, self.o, self.h, self.l, self.c, self.v);
        let vwap = self.vw.unwrap_or(bar.vwap);
        Ok(bar.with_trades(self.n, vwap))
    }
}

/// Minute bars from Alpaca's crypto feed, resampled to the trading interval.
///
/// The newest bucket may still be forming; its close is the latest trade.
pub struct AlpacaCryptoSource {
    client: Client,
    base_url: String,
}

impl AlpacaCryptoSource {
    /// Create an unauthenticated source. Crypto bars do not require keys.
    pub fn new(timeout: Duration) -> Result<Self, DataError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: DATA_URL.to_string(),
        })
    }

    /// Create a source that sends API credentials for higher rate limits.
    pub fn with_credentials(api_key: &str, api_secret: &str, timeout: Duration) -> Result<Self, DataError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            "APCA-API-KEY-ID",
            header::HeaderValue::from_str(api_key)
                .map_err(|e| DataError::ConnectionError(e.to_string()))?,
        );
        headers.insert(
            "APCA-API-SECRET-KEY",
            header::HeaderValue::from_str(api_secret)
                .map_err(|e| DataError::ConnectionError(e.to_string()))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: DATA_URL.to_string(),
        })
    }

    /// Fetch raw one-minute bars from `start` to now, following pagination.
    async fn fetch_minute_bars(&self, symbol: &str, start: DateTime<Utc>) -> Result<Vec<Bar>, DataError> {
        let url = format!("{}/v1beta3/crypto/us/bars", self.base_url);
        let start = start.to_rfc3339_opts(SecondsFormat::Secs, true);

        let mut bars = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut params = vec![
                ("symbols", symbol.to_string()),
                ("timeframe", "1Min".to_string()),
                ("start", start.clone()),
                ("limit", PAGE_LIMIT.to_string()),
                ("sort", "asc".to_string()),
            ];
            if let Some(token) = &page_token {
                params.push(("page_token", token.clone()));
            }

            let resp = self
                .client
                .get(&url)
                .query(&params)
                .send()
                .await
                .map_err(|e| {
                    if e.is_timeout() {
                        DataError::ConnectionError(format!("request timed out: {}", e))
                    } else {
                        DataError::ConnectionError(e.to_string())
                    }
                })?;

            if !resp.status().is_success() {
                let status = resp.status();
                let text = resp.text().await.unwrap_or_default();
                return Err(match status {
                    StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST => {
                        DataError::SymbolNotFound(format!("{}: {}", symbol, text))
                    }
                    _ => DataError::ConnectionError(format!("{}: {}", status, text)),
                });
            }

            let mut page: AlpacaBarsResponse = resp
                .json()
                .await
                .map_err(|e| DataError::ParseError(e.to_string()))?;

            if let Some(raw) = page.bars.remove(symbol) {
                for bar in raw {
                    bars.push(bar.into_bar()?);
                }
            }

            debug!(symbol, total = bars.len(), "Fetched bar page");

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(bars)
    }
}

#[async_trait]
impl BarSource for AlpacaCryptoSource {
    async fn fetch_bars(
        &self,
        symbol: &str,
        lookback: usize,
        interval: BarInterval,
    ) -> Result<Vec<Bar>, DataError> {
        let minutes = i64::try_from(lookback)
            .ok()
            .and_then(|n| n.checked_mul(i64::from(interval.minutes())))
            .ok_or_else(|| DataError::InvalidInterval(format!("lookback {} too large", lookback)))?;
        let start = Utc::now() - ChronoDuration::minutes(minutes);

        let minute_bars = self.fetch_minute_bars(symbol, start).await?;
        let mut bars = resample(&minute_bars, interval);

        // Keep the newest `lookback` buckets
        if bars.len() > lookback {
            bars.drain(..bars.len() - lookback);
        }

        Ok(bars)
    }

    fn name(&self) -> &str {
        "Alpaca Crypto"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bars_page() {
        let raw = r#"{
            "bars": {
                "ETH/USD": [
                    {"t": "2024-03-01T10:00:00Z", "o": 3400.1, "h": 3402.0, "l": 3399.5,
                     "c": 3401.2, "v": 12.5, "n": 40, "vw": 3400.8},
                    {"t": "2024-03-01T10:01:00Z", "o": 3401.2, "h": 3403.0, "l": 3400.0,
                     "c": 3402.9, "v": 3.25, "n": 11, "vw": 3401.9}
                ]
            },
            "next_page_token": null
        }"#;

        let mut page: AlpacaBarsResponse = serde_json::from_str(raw).unwrap();
        assert!(page.next_page_token.is_none());

        let bars: Vec<Bar> = page
            .bars
            .remove("ETH/USD")
            .unwrap()
            .into_iter()
            .map(|b| b.into_bar().unwrap())
            .collect();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].timestamp, 1_709_287_200_000);
        assert_eq!(bars[1].timestamp - bars[0].timestamp, 60_000);
        assert_eq!(bars[0].trade_count, 40);
        assert_eq!(bars[1].vwap, 3401.9);
    }

    #[test]
    fn test_missing_vwap_falls_back() {
        let raw = r#"{"t": "2024-03-01T10:00:00Z", "o": 1.0, "h": 3.0, "l": 0.0, "c": 3.0, "v": 1.0}"#;
        let bar = serde_json::from_str::<AlpacaBar>(raw).unwrap().into_bar().unwrap();
        assert_eq!(bar.vwap, 2.0);
        assert_eq!(bar.trade_count, 0);
    }

    #[test]
    fn test_bad_timestamp() {
        let raw = r#"{"t": "yesterday", "o": 1.0, "h": 1.0, "l": 1.0, "c": 1.0, "v": 1.0}"#;
        let result = serde_json::from_str::<AlpacaBar>(raw).unwrap().into_bar();
        assert!(matches!(result, Err(DataError::ParseError(_))));
    }
}
