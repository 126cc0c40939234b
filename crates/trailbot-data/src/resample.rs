//! Bucketing of fine-grained bars into wider intervals.

use trailbot_core::types::{Bar, BarInterval};

/// Aggregate ascending bars into epoch-aligned `interval` buckets.
///
/// Open is the first open, high the max, low the min, close the last close.
/// Volume and trade count are summed and VWAP is the mean of the input
/// VWAPs. Buckets without input bars are not emitted.
pub fn resample(bars: &[Bar], interval: BarInterval) -> Vec<Bar> {
    let mut out: Vec<Bar> = Vec::new();
    let mut vwap_count = 0u32;

    for bar in bars {
        let bucket = interval.bucket_start(bar.timestamp);

        match out.last_mut() {
            Some(current) if current.timestamp == bucket => {
                current.high = current.high.max(bar.high);
                current.low = current.low.min(bar.low);
                current.close = bar.close;
                current.volume += bar.volume;
                current.trade_count += bar.trade_count;
                // Running mean
                vwap_count += 1;
                current.vwap += (bar.vwap - current.vwap) / f64::from(vwap_count);
            }
            _ => {
                out.push(Bar {
                    timestamp: bucket,
                    ..*bar
                });
                vwap_count = 1;
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: i64 = 60_000;

    fn minute_bar(minute: i64, open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar::new(minute * MINUTE, open, high, low, close, 1.0).with_trades(2, close)
    }

    #[test]
    fn test_resample_aggregates_bucket() {
        let interval = BarInterval::from_minutes(15).unwrap();
        let bars = vec![
            minute_bar(0, 100.0, 101.0, 99.0, 100.5),
            minute_bar(1, 100.5, 104.0, 100.0, 103.0),
            minute_bar(14, 103.0, 103.5, 98.0, 99.0),
        ];

        let out = resample(&bars, interval);
        assert_eq!(out.len(), 1);

        let bucket = out[0];
        assert_eq!(bucket.timestamp, 0);
        assert_eq!(bucket.open, 100.0);
        assert_eq!(bucket.high, 104.0);
        assert_eq!(bucket.low, 98.0);
        assert_eq!(bucket.close, 99.0);
        assert_eq!(bucket.volume, 3.0);
        assert_eq!(bucket.trade_count, 6);
        assert!((bucket.vwap - (100.5 + 103.0 + 99.0) / 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_resample_aligns_to_epoch() {
        let interval = BarInterval::from_minutes(15).unwrap();
        let bars = vec![
            minute_bar(7, 1.0, 1.0, 1.0, 1.0),
            minute_bar(16, 2.0, 2.0, 2.0, 2.0),
            minute_bar(29, 3.0, 3.0, 3.0, 3.0),
            minute_bar(30, 4.0, 4.0, 4.0, 4.0),
        ];

        let out = resample(&bars, interval);
        let starts: Vec<i64> = out.iter().map(|b| b.timestamp / MINUTE).collect();
        assert_eq!(starts, vec![0, 15, 30]);
        assert_eq!(out[1].open, 2.0);
        assert_eq!(out[1].close, 3.0);
    }

    #[test]
    fn test_resample_drops_empty_buckets() {
        let interval = BarInterval::from_minutes(5).unwrap();
        // Nothing traded between minute 1 and minute 22
        let bars = vec![
            minute_bar(1, 1.0, 1.0, 1.0, 1.0),
            minute_bar(22, 2.0, 2.0, 2.0, 2.0),
        ];

        let out = resample(&bars, interval);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].timestamp, 0);
        assert_eq!(out[1].timestamp, 20 * MINUTE);
    }

    #[test]
    fn test_resample_empty() {
        let interval = BarInterval::default();
        assert!(resample(&[], interval).is_empty());
    }
}
