//! Bar interval (bucket width) definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Width of one bar bucket, in whole minutes.
///
/// Buckets are aligned to the Unix epoch, so a 15-minute interval produces
/// buckets starting at :00, :15, :30 and :45.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct BarInterval(u32);

impl BarInterval {
    /// Create an interval of `minutes` minutes. Returns `None` for zero.
    pub fn from_minutes(minutes: u32) -> Option<Self> {
        (minutes > 0).then_some(Self(minutes))
    }

    /// Get the interval in minutes.
    pub fn minutes(&self) -> u32 {
        self.0
    }

    /// Get the duration of the interval in seconds.
    pub fn as_secs(&self) -> u64 {
        u64::from(self.0) * 60
    }

    /// Get the duration of the interval in milliseconds.
    pub fn as_millis(&self) -> i64 {
        i64::from(self.0) * 60_000
    }

    /// Start of the bucket containing `timestamp_ms`.
    pub fn bucket_start(&self, timestamp_ms: i64) -> i64 {
        timestamp_ms - timestamp_ms.rem_euclid(self.as_millis())
    }
}

impl Default for BarInterval {
    fn default() -> Self {
        Self(15)
    }
}

impl TryFrom<u32> for BarInterval {
    type Error = String;

    fn try_from(minutes: u32) -> Result<Self, Self::Error> {
        Self::from_minutes(minutes).ok_or_else(|| "Bar interval must be at least 1 minute".into())
    }
}

impl From<BarInterval> for u32 {
    fn from(interval: BarInterval) -> Self {
        interval.0
    }
}

impl fmt::Display for BarInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 60 == 0 {
            write!(f, "{}h", self.0 / 60)
        } else {
            write!(f, "{}m", self.0)
        }
    }
}

impl FromStr for BarInterval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        let (digits, scale) = if let Some(n) = lower.strip_suffix("min") {
            (n, 1)
        } else if let Some(n) = lower.strip_suffix('m') {
            (n, 1)
        } else if let Some(n) = lower.strip_suffix('h') {
            (n, 60)
        } else {
            (lower.as_str(), 1)
        };

        digits
            .parse::<u32>()
            .ok()
            .and_then(|n| n.checked_mul(scale))
            .and_then(Self::from_minutes)
            .ok_or_else(|| format!("Invalid bar interval: {}", s))
    }
}
