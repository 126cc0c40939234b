//! Bar enrichment.
//!
//! Runs every indicator over the same closed-bar window and joins the
//! outputs onto the bars they belong to. Bars that precede the longest
//! warm-up window are dropped, so every [`EnrichedBar`] carries a full set
//! of derived fields.

use serde::{Deserialize, Serialize};
use trailbot_core::error::IndicatorError;
use trailbot_core::traits::{BarIndicator, Indicator};
use trailbot_core::types::{Bar, EnrichedBar};

use crate::{Atr, Rsi, Sma};

/// Indicator window lengths, in bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorParams {
    /// Short trend average window
    pub sma_short: usize,
    /// Long trend average window
    pub sma_long: usize,
    /// Momentum oscillator window
    pub rsi_period: usize,
    /// Volatility window
    pub atr_period: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            sma_short: 20,
            sma_long: 50,
            rsi_period: 14,
            atr_period: 14,
        }
    }
}

impl IndicatorParams {
    /// Check that every window is at least one bar wide.
    pub fn validate(&self) -> Result<(), IndicatorError> {
        let windows = [
            ("sma_short", self.sma_short),
            ("sma_long", self.sma_long),
            ("rsi_period", self.rsi_period),
            ("atr_period", self.atr_period),
        ];

        for (name, value) in windows {
            if value == 0 {
                return Err(IndicatorError::InvalidParameter(format!(
                    "{} must be greater than 0",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// Computes the derived fields for a window of closed bars.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    params: IndicatorParams,
    sma_short: Sma,
    sma_long: Sma,
    rsi: Rsi,
    atr: Atr,
}

impl IndicatorEngine {
    /// Create an engine for the given windows.
    pub fn new(params: IndicatorParams) -> Result<Self, IndicatorError> {
        params.validate()?;

        Ok(Self {
            params,
            sma_short: Sma::new(params.sma_short),
            sma_long: Sma::new(params.sma_long),
            rsi: Rsi::new(params.rsi_period),
            atr: Atr::new(params.atr_period),
        })
    }

    /// Get the configured windows.
    pub fn params(&self) -> &IndicatorParams {
        &self.params
    }

    /// Number of bars needed before the first enriched bar exists.
    ///
    /// RSI and ATR both read the previous close, so each needs one bar more
    /// than its window.
    pub fn warmup_period(&self) -> usize {
        Indicator::period(&self.sma_short)
            .max(Indicator::period(&self.sma_long))
            .max(Indicator::period(&self.rsi))
            .max(BarIndicator::period(&self.atr))
    }

    /// Enrich a window of bars, oldest first.
    ///
    /// Returns `n - warmup + 1` bars; the first corresponds to
    /// `bars[warmup - 1]` and the last to the newest input bar.
    pub fn enrich(&self, bars: &[Bar]) -> Result<Vec<EnrichedBar>, IndicatorError> {
        let warmup = self.warmup_period();
        if bars.len() < warmup {
            return Err(IndicatorError::InsufficientData {
                required: warmup,
                available: bars.len(),
            });
        }

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let sma_short = self.sma_short.calculate(&closes);
        let sma_long = self.sma_long.calculate(&closes);
        let rsi = self.rsi.calculate(&closes);
        let atr = BarIndicator::calculate(&self.atr, bars);

        // Output k of an indicator with period p belongs to bar p - 1 + k
        let at = |values: &[f64], period: usize, i: usize| values[i + 1 - period];

        let short_period = Indicator::period(&self.sma_short);
        let long_period = Indicator::period(&self.sma_long);
        let rsi_period = Indicator::period(&self.rsi);
        let atr_period = BarIndicator::period(&self.atr);

        let enriched = (warmup - 1..bars.len())
            .map(|i| EnrichedBar {
                bar: bars[i],
                sma_short: at(&sma_short, short_period, i),
                sma_long: at(&sma_long, long_period, i),
                rsi: at(&rsi, rsi_period, i),
                atr: at(&atr, atr_period, i),
            })
            .collect();

        Ok(enriched)
    }

    /// Enrich and return only the newest bar.
    pub fn latest(&self, bars: &[Bar]) -> Result<EnrichedBar, IndicatorError> {
        let warmup = self.warmup_period();
        let enriched = self.enrich(bars)?;
        enriched
            .last()
            .copied()
            .ok_or(IndicatorError::InsufficientData {
                required: warmup,
                available: bars.len(),
            })
    }
}
