//! CSV data source.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use trailbot_core::error::DataError;
use trailbot_core::types::{validate_series, Bar};

/// CSV record format.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(alias = "Date", alias = "date", alias = "timestamp", alias = "Timestamp")]
    date: String,
    #[serde(alias = "Open", alias = "open")]
    open: f64,
    #[serde(alias = "High", alias = "high")]
    high: f64,
    #[serde(alias = "Low", alias = "low")]
    low: f64,
    #[serde(alias = "Close", alias = "close", alias = "Adj Close")]
    close: f64,
    #[serde(alias = "Volume", alias = "volume", default)]
    volume: f64,
    #[serde(alias = "trades", alias = "n", default)]
    trade_count: Option<u64>,
    #[serde(alias = "VWAP", alias = "vw", default)]
    vwap: Option<f64>,
}

/// CSV data source for historical bars.
pub struct CsvDataSource {
    path: PathBuf,
}

impl CsvDataSource {
    /// Create a new CSV data source.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DataError::NoDataAvailable);
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Load all bars, sorted by timestamp.
    ///
    /// # Errors
    /// `DataError::OutOfOrder` if two rows share a timestamp.
    pub fn load_all(&self) -> Result<Vec<Bar>, DataError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .map_err(|e| DataError::ParseError(e.to_string()))?;

        let mut bars = Vec::new();

        for result in reader.deserialize() {
            let record: CsvRecord = result.map_err(|e| DataError::ParseError(e.to_string()))?;
            bars.push(record_to_bar(record)?);
        }

        // Sort by timestamp
        bars.sort_by_key(|b| b.timestamp);
        validate_series(&bars)?;

        if bars.is_empty() {
            return Err(DataError::NoDataAvailable);
        }

        Ok(bars)
    }
}

fn record_to_bar(record: CsvRecord) -> Result<Bar, DataError> {
    let timestamp = parse_timestamp(&record.date)?;
    let mut bar = Bar::new(
        timestamp,
        record.open,
        record.high,
        record.low,
        record.close,
        record.volume,
    );
    if let Some(count) = record.trade_count {
        bar.trade_count = count;
    }
    if let Some(vwap) = record.vwap {
        bar.vwap = vwap;
    }
    Ok(bar)
}

/// Parse various timestamp formats into Unix milliseconds.
fn parse_timestamp(date_str: &str) -> Result<i64, DataError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(date_str) {
        return Ok(dt.timestamp_millis());
    }

    let datetime_formats = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
    for format in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(date_str, format) {
            return Ok(dt.and_utc().timestamp_millis());
        }
    }

    let date_formats = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"];
    for format in date_formats {
        if let Ok(d) = NaiveDate::parse_from_str(date_str, format) {
            if let Some(dt) = d.and_hms_opt(0, 0, 0) {
                return Ok(dt.and_utc().timestamp_millis());
            }
        }
    }

    // Try parsing as Unix timestamp
    if let Ok(ts) = date_str.parse::<i64>() {
        // Assume milliseconds if > 10 digits
        if ts > 10_000_000_000 {
            return Ok(ts);
        } else {
            return Ok(ts * 1000);
        }
    }

    Err(DataError::ParseError(format!(
        "Could not parse date: {}",
        date_str
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("trailbot-{}-{}.csv", name, std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_parse_timestamp() {
        // Test various formats
        assert_eq!(parse_timestamp("2024-01-15").unwrap(), 1_705_276_800_000);
        assert!(parse_timestamp("2024-01-15 10:30:00").is_ok());
        assert!(parse_timestamp("2024-01-15T10:30:00Z").is_ok());
        assert_eq!(parse_timestamp("1705312800000").unwrap(), 1_705_312_800_000); // Unix ms
        assert_eq!(parse_timestamp("1705312800").unwrap(), 1_705_312_800_000); // Unix sec
        assert!(parse_timestamp("soon").is_err());
    }

    #[test]
    fn test_load_sorts_rows() {
        let path = write_csv(
            "sorted",
            "timestamp,open,high,low,close,volume,trade_count,vwap\n\
             2024-01-01 00:15:00,2,3,1,2.5,10,4,2.2\n\
             2024-01-01 00:00:00,1,2,0.5,1.5,5,2,1.1\n",
        );

        let bars = CsvDataSource::new(&path).unwrap().load_all().unwrap();
        assert_eq!(bars.len(), 2);
        assert!(bars[0].timestamp < bars[1].timestamp);
        assert_eq!(bars[0].close, 1.5);
        assert_eq!(bars[1].trade_count, 4);
        assert_eq!(bars[1].vwap, 2.2);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_optional_columns() {
        let path = write_csv("plain", "Date,Open,High,Low,Close\n2024-01-02,10,12,9,11\n");

        let bars = CsvDataSource::new(&path).unwrap().load_all().unwrap();
        assert_eq!(bars[0].volume, 0.0);
        assert_eq!(bars[0].trade_count, 0);
        assert!((bars[0].vwap - (12.0 + 9.0 + 11.0) / 3.0).abs() < 1e-10);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_duplicate_rows_rejected() {
        let path = write_csv(
            "dupes",
            "timestamp,open,high,low,close\n1705312800,1,1,1,1\n1705312800,1,1,1,1\n",
        );

        let result = CsvDataSource::new(&path).unwrap().load_all();
        assert!(matches!(result, Err(DataError::OutOfOrder { .. })));

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            CsvDataSource::new("/nonexistent/bars.csv"),
            Err(DataError::NoDataAvailable)
        ));
    }
}
