//! Trend + momentum confirmation rule.
//!
//! Buys when the short trend average sits above the long one and momentum
//! is above its midpoint; sells on the mirror image. Anything else,
//! including exact ties, holds.

use tracing::trace;
use trailbot_core::{
    traits::SignalGenerator,
    types::{EnrichedBar, Signal},
};

/// Trend-following signal confirmed by momentum.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrendMomentum;

impl TrendMomentum {
    /// Momentum level separating bullish from bearish readings.
    pub const MIDPOINT: f64 = 50.0;

    /// Create the rule.
    pub fn new() -> Self {
        Self
    }
}

impl SignalGenerator for TrendMomentum {
    fn name(&self) -> &str {
        "Trend Momentum"
    }

    fn description(&self) -> &str {
        "BUY when short SMA > long SMA and RSI > 50, SELL on the opposite, HOLD otherwise"
    }

    fn evaluate(&self, bar: &EnrichedBar) -> Signal {
        let signal = if bar.sma_short > bar.sma_long && bar.rsi > Self::MIDPOINT {
            Signal::Buy
        } else if bar.sma_short < bar.sma_long && bar.rsi < Self::MIDPOINT {
            Signal::Sell
        } else {
            Signal::Hold
        };

        trace!(
            sma_short = bar.sma_short,
            sma_long = bar.sma_long,
            rsi = bar.rsi,
            %signal,
            "Evaluated bar"
        );

        signal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use trailbot_core::types::Bar;

    fn enriched(sma_short: f64, sma_long: f64, rsi: f64) -> EnrichedBar {
        EnrichedBar {
            bar: Bar::new(0, 100.0, 101.0, 99.0, 100.0, 1.0),
            sma_short,
            sma_long,
            rsi,
            atr: 1.0,
        }
    }

    #[test]
    fn test_buy_requires_both_conditions() {
        let rule = TrendMomentum::new();

        assert_eq!(rule.evaluate(&enriched(105.0, 100.0, 60.0)), Signal::Buy);
        // Uptrend without momentum
        assert_eq!(rule.evaluate(&enriched(105.0, 100.0, 40.0)), Signal::Hold);
        // Momentum without uptrend
        assert_eq!(rule.evaluate(&enriched(95.0, 100.0, 60.0)), Signal::Hold);
    }

    #[test]
    fn test_sell_requires_both_conditions() {
        let rule = TrendMomentum::new();

        assert_eq!(rule.evaluate(&enriched(95.0, 100.0, 40.0)), Signal::Sell);
        assert_eq!(rule.evaluate(&enriched(95.0, 100.0, 55.0)), Signal::Hold);
    }

    #[test]
    fn test_ties_hold() {
        let rule = TrendMomentum::new();

        // Equal averages
        assert_eq!(rule.evaluate(&enriched(100.0, 100.0, 80.0)), Signal::Hold);
        assert_eq!(rule.evaluate(&enriched(100.0, 100.0, 20.0)), Signal::Hold);
        // Momentum exactly at the midpoint
        assert_eq!(rule.evaluate(&enriched(105.0, 100.0, 50.0)), Signal::Hold);
        assert_eq!(rule.evaluate(&enriched(95.0, 100.0, 50.0)), Signal::Hold);
    }

    proptest! {
        #[test]
        fn prop_signal_is_pure(
            short in 1.0f64..1000.0,
            long in 1.0f64..1000.0,
            rsi in 0.0f64..=100.0,
        ) {
            let rule = TrendMomentum::new();
            let bar = enriched(short, long, rsi);
            prop_assert_eq!(rule.evaluate(&bar), rule.evaluate(&bar));
        }

        #[test]
        fn prop_signal_matches_rule(
            short in 1.0f64..1000.0,
            long in 1.0f64..1000.0,
            rsi in 0.0f64..=100.0,
        ) {
            let signal = TrendMomentum::new().evaluate(&enriched(short, long, rsi));
            let bullish = short > long && rsi > 50.0;
            let bearish = short < long && rsi < 50.0;

            prop_assert!(!(bullish && bearish));
            match signal {
                Signal::Buy => prop_assert!(bullish),
                Signal::Sell => prop_assert!(bearish),
                Signal::Hold => prop_assert!(!bullish && !bearish),
            }
        }
    }
}
