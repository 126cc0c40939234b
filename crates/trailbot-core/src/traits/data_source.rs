//! Bar source trait definition.

use crate::error::DataError;
use crate::types::{Bar, BarInterval};
use async_trait::async_trait;

/// Source of recent market bars.
#[async_trait]
pub trait BarSource: Send + Sync {
    /// Fetch up to `lookback` of the most recent bars.
    ///
    /// # Arguments
    /// * `symbol` - The symbol to fetch
    /// * `lookback` - Number of bars wanted
    /// * `interval` - Bucket width
    ///
    /// # Returns
    /// Bars ordered from oldest to newest. May hold fewer than `lookback`
    /// bars, or none at all during illiquid periods.
    async fn fetch_bars(
        &self,
        symbol: &str,
        lookback: usize,
        interval: BarInterval,
    ) -> Result<Vec<Bar>, DataError>;

    /// Get the data source name.
    fn name(&self) -> &str;
}
