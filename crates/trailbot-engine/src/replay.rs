//! Historical replay through the live decision cycle.
//!
//! Bars are revealed one at a time to a [`DecisionCycle`] trading against an
//! in-memory [`PaperBroker`]. Fills happen at the marked close with the
//! broker's slippage; no attempt is made at realistic execution.

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::info;
use trailbot_broker::PaperBroker;
use trailbot_core::error::{DataError, IndicatorError, TradingError};
use trailbot_core::traits::{BarSource, Broker};
use trailbot_core::types::{validate_series, Bar, BarInterval, Portfolio};
use trailbot_indicators::IndicatorEngine;
use trailbot_strategy::TrendMomentum;

use crate::cycle::{CycleConfig, DecisionCycle};
use crate::summary::RunSummary;

/// Serves the trailing window of a recorded series up to a moving cursor.
pub struct ReplaySource {
    bars: Vec<Bar>,
    cursor: AtomicUsize,
}

impl ReplaySource {
    /// Create a source that initially reveals the first `revealed` bars.
    pub fn new(bars: Vec<Bar>, revealed: usize) -> Self {
        let revealed = revealed.min(bars.len());
        Self {
            bars,
            cursor: AtomicUsize::new(revealed),
        }
    }

    /// Reveal one more bar. Returns `false` once the series is exhausted.
    pub fn advance(&self) -> bool {
        let current = self.cursor.load(Ordering::SeqCst);
        if current >= self.bars.len() {
            return false;
        }
        self.cursor.store(current + 1, Ordering::SeqCst);
        true
    }

    /// Number of bars revealed so far.
    pub fn revealed(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BarSource for ReplaySource {
    async fn fetch_bars(
        &self,
        _symbol: &str,
        lookback: usize,
        _interval: BarInterval,
    ) -> Result<Vec<Bar>, DataError> {
        let end = self.revealed();
        let start = end.saturating_sub(lookback);
        Ok(self.bars[start..end].to_vec())
    }

    fn name(&self) -> &str {
        "Replay"
    }
}

/// Replay settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// Decision cycle settings
    pub cycle: CycleConfig,
    /// Starting cash of the paper account
    pub initial_capital: Decimal,
    /// Slippage in percent against the taker
    pub slippage_pct: Decimal,
    /// Commission in percent of traded value
    pub commission_pct: Decimal,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            cycle: CycleConfig::default(),
            initial_capital: dec!(10000),
            slippage_pct: dec!(0.05),
            commission_pct: Decimal::ZERO,
        }
    }
}

/// Result of a replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayReport {
    /// Settings used
    pub config: ReplayConfig,
    /// Per-cycle counters and equity history
    pub summary: RunSummary,
    /// Paper account at the end of the replay
    pub final_portfolio: Portfolio,
}

impl ReplayReport {
    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Walks a recorded series through the decision cycle.
pub struct ReplayEngine {
    config: ReplayConfig,
}

impl ReplayEngine {
    /// Create a new replay engine.
    pub fn new(config: ReplayConfig) -> Self {
        Self { config }
    }

    /// Replay `bars`, one cycle per bar after the indicator warm-up.
    ///
    /// # Errors
    /// Invalid settings, an unordered series, a series shorter than the
    /// warm-up, or any fatal cycle error.
    pub async fn run(&self, bars: Vec<Bar>) -> Result<ReplayReport, TradingError> {
        validate_series(&bars)?;

        let warmup = IndicatorEngine::new(self.config.cycle.indicators)?.warmup_period();
        if bars.len() < warmup {
            return Err(IndicatorError::InsufficientData {
                required: warmup,
                available: bars.len(),
            }
            .into());
        }

        let total = bars.len();
        let source = Arc::new(ReplaySource::new(bars, warmup));
        let broker = Arc::new(
            PaperBroker::new(self.config.initial_capital)
                .with_slippage(self.config.slippage_pct)
                .with_commission(self.config.commission_pct),
        );

        let mut cycle = DecisionCycle::new(
            self.config.cycle.clone(),
            source.clone(),
            broker.clone(),
            Box::new(TrendMomentum::new()),
        )?;

        let mut summary = RunSummary::new(
            self.config.cycle.symbol.clone(),
            Some(self.config.initial_capital),
        );

        info!(
            symbol = %self.config.cycle.symbol,
            bars = total,
            warmup,
            "Starting replay"
        );

        loop {
            match cycle.run_once().await {
                Ok(report) => {
                    summary.record(&report);
                    let equity = broker.get_equity().await?;
                    summary.record_equity(report.bar_time.timestamp_millis(), equity);
                }
                Err(e) => summary.absorb(e)?,
            }

            if !source.advance() {
                break;
            }
        }

        summary.final_state = cycle.state();
        let final_portfolio = broker.portfolio_snapshot()?;
        summary.final_equity = Some(final_portfolio.equity);

        info!(
            cycles = summary.cycles,
            entries = summary.entries,
            exits = summary.exits(),
            equity = %final_portfolio.equity,
            "Replay finished"
        );

        Ok(ReplayReport {
            config: self.config.clone(),
            summary,
            final_portfolio,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trailbot_risk::ExitReason;

    const BAR_MS: i64 = 900_000;

    /// Rises for `up` bars, then falls for `down` bars.
    fn rise_then_fall(up: usize, down: usize) -> Vec<Bar> {
        let mut price: f64 = 100.0;
        let mut bars = Vec::new();
        for i in 0..up + down {
            let open = price;
            price += if i < up {
                if i % 5 == 4 { -0.3 } else { 1.0 }
            } else {
                -1.5
            };
            let high = open.max(price) + 0.2;
            let low = open.min(price) - 0.2;
            bars.push(Bar::new(i as i64 * BAR_MS, open, high, low, price, 5.0));
        }
        bars
    }

    #[tokio::test]
    async fn test_source_reveals_trailing_window() {
        let bars = rise_then_fall(10, 0);
        let source = ReplaySource::new(bars.clone(), 4);

        let window = source.fetch_bars("X", 3, BarInterval::default()).await.unwrap();
        assert_eq!(window, bars[1..4].to_vec());

        assert!(source.advance());
        let window = source.fetch_bars("X", 100, BarInterval::default()).await.unwrap();
        assert_eq!(window.len(), 5);
    }

    #[tokio::test]
    async fn test_source_exhausts() {
        let source = ReplaySource::new(rise_then_fall(3, 0), 2);
        assert!(source.advance());
        assert!(!source.advance());
        assert_eq!(source.revealed(), 3);
    }

    #[tokio::test]
    async fn test_replay_round_trip_trade() {
        let engine = ReplayEngine::new(ReplayConfig::default());
        let report = engine.run(rise_then_fall(120, 30)).await.unwrap();
        let summary = &report.summary;

        // One cycle per bar from the warm-up onward
        assert_eq!(summary.cycles, 150 - 50 + 1);
        assert!(summary.entries >= 1);
        assert!(summary.exits() >= 1);
        // The slide at the end must have closed the last position
        assert!(!summary.final_state.in_position());
        assert!(summary
            .trades
            .iter()
            .any(|t| t.reason == Some(ExitReason::TrailingStop) || t.reason == Some(ExitReason::TakeProfit)));
        assert_eq!(summary.final_equity, Some(report.final_portfolio.equity));
    }

    /// ETH-like prices around 2000 with a true range near 10.
    fn eth_like(n: usize) -> Vec<Bar> {
        let mut price: f64 = 2000.0;
        (0..n)
            .map(|i| {
                let open = price;
                price += match i % 6 {
                    5 => -6.0,
                    _ if i < n / 2 => 4.0,
                    _ => -3.0,
                };
                let high = open.max(price) + 3.0;
                let low = open.min(price) - 3.0;
                Bar::new(i as i64 * BAR_MS, open, high, low, price, 12.0)
            })
            .collect()
    }

    #[tokio::test]
    async fn test_default_config_trades_realistic_prices() {
        // The risk-sized notional here is several times the 10000 account
        let report = ReplayEngine::new(ReplayConfig::default())
            .run(eth_like(300))
            .await
            .unwrap();
        let summary = &report.summary;

        assert_eq!(summary.cycles, 251);
        assert!(summary.entries >= 1);
        assert_eq!(summary.retried_cycles, 0);
        assert!(report.final_portfolio.cash >= Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_replay_too_short() {
        let engine = ReplayEngine::new(ReplayConfig::default());
        let err = engine.run(rise_then_fall(20, 0)).await.unwrap_err();
        assert!(matches!(
            err,
            TradingError::Indicator(IndicatorError::InsufficientData {
                required: 50,
                available: 20
            })
        ));
    }

    #[tokio::test]
    async fn test_replay_rejects_unordered() {
        let mut bars = rise_then_fall(60, 0);
        bars.swap(10, 11);
        let err = ReplayEngine::new(ReplayConfig::default()).run(bars).await.unwrap_err();
        assert!(matches!(err, TradingError::Data(DataError::OutOfOrder { .. })));
    }
}
