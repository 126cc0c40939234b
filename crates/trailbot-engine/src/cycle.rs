//! One decision cycle: fetch, enrich, decide, act.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use trailbot_core::error::{DataError, TradingError};
use trailbot_core::traits::{BarSource, Broker, SignalGenerator};
use trailbot_core::types::{validate_series, BarInterval, Signal, TimeInForce};
use trailbot_indicators::{IndicatorEngine, IndicatorParams};
use trailbot_risk::RiskParameters;

use crate::machine::{PositionStateMachine, Transition};
use crate::state::PositionState;

/// Settings for a decision cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleConfig {
    /// Traded symbol, e.g. `ETH/USD`
    pub symbol: String,
    /// Bar width
    pub interval: BarInterval,
    /// Bars requested from the source each cycle
    pub lookback: usize,
    /// Time in force for submitted orders
    pub time_in_force: TimeInForce,
    /// Bound on each external call
    pub call_timeout: Duration,
    /// Indicator windows
    pub indicators: IndicatorParams,
    /// Sizing and exit parameters
    pub risk: RiskParameters,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            symbol: "ETH/USD".to_string(),
            interval: BarInterval::default(),
            lookback: 100,
            time_in_force: TimeInForce::GTC,
            call_timeout: Duration::from_secs(30),
            indicators: IndicatorParams::default(),
            risk: RiskParameters::default(),
        }
    }
}

/// Outcome of a completed cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleReport {
    /// Start of the latest bar
    pub bar_time: DateTime<Utc>,
    /// Signal for the latest bar
    pub signal: Signal,
    /// Latest close
    pub price: Decimal,
    /// Latest ATR
    pub volatility: Decimal,
    /// What the position state machine did
    pub transition: Transition,
    /// State after the cycle
    pub state: PositionState,
}

/// Runs the per-interval decision for one symbol.
///
/// Owns the position state; the scheduler calls [`run_once`](Self::run_once)
/// once per bar interval.
pub struct DecisionCycle {
    config: CycleConfig,
    source: Arc<dyn BarSource>,
    broker: Arc<dyn Broker>,
    strategy: Box<dyn SignalGenerator>,
    indicators: IndicatorEngine,
    machine: PositionStateMachine,
}

impl DecisionCycle {
    /// Create a cycle, starting flat.
    ///
    /// # Errors
    /// `TradingError::Config` if the windows or risk parameters are invalid,
    /// or if the lookback cannot cover the indicator warm-up.
    pub fn new(
        config: CycleConfig,
        source: Arc<dyn BarSource>,
        broker: Arc<dyn Broker>,
        strategy: Box<dyn SignalGenerator>,
    ) -> Result<Self, TradingError> {
        config.risk.validate()?;
        let indicators = IndicatorEngine::new(config.indicators)
            .map_err(|e| TradingError::Config(e.to_string()))?;

        if config.lookback < indicators.warmup_period() {
            return Err(TradingError::Config(format!(
                "lookback of {} bars cannot cover the {}-bar indicator warm-up",
                config.lookback,
                indicators.warmup_period()
            )));
        }

        let machine = PositionStateMachine::new(config.symbol.clone(), &config.risk)
            .with_time_in_force(config.time_in_force)
            .with_call_timeout(config.call_timeout);

        info!(
            symbol = %config.symbol,
            strategy = strategy.name(),
            rule = strategy.description(),
            warmup = indicators.warmup_period(),
            "Decision cycle ready"
        );

        Ok(Self {
            config,
            source,
            broker,
            strategy,
            indicators,
            machine,
        })
    }

    /// Resume from a known position state.
    pub fn with_state(mut self, state: PositionState) -> Self {
        self.machine = self.machine.with_state(state);
        self
    }

    /// Seed the position state from what the broker already holds.
    ///
    /// Run once before the first cycle so a restart while long resumes the
    /// position instead of buying a second one.
    ///
    /// # Errors
    /// A failed position query other than `PositionNotFound`.
    pub async fn reconcile(&mut self) -> Result<PositionState, TradingError> {
        self.machine.reconcile(self.broker.as_ref()).await
    }

    /// Get the current position state.
    pub fn state(&self) -> PositionState {
        self.machine.state()
    }

    /// Get the cycle configuration.
    pub fn config(&self) -> &CycleConfig {
        &self.config
    }

    /// Get the broker the cycle trades through.
    pub fn broker(&self) -> &Arc<dyn Broker> {
        &self.broker
    }

    /// Run one cycle.
    ///
    /// # Errors
    /// Any data, indicator, sizing or broker failure. The position state is
    /// left consistent; see [`TradingError::disposition`] for recovery.
    pub async fn run_once(&mut self) -> Result<CycleReport, TradingError> {
        let symbol = self.config.symbol.as_str();
        let limit = self.config.call_timeout;

        let bars = tokio::time::timeout(
            limit,
            self.source
                .fetch_bars(symbol, self.config.lookback, self.config.interval),
        )
        .await
        .map_err(|_| DataError::Timeout(limit.as_secs()))??;

        if bars.is_empty() {
            return Err(DataError::NoDataAvailable.into());
        }
        validate_series(&bars)?;

        let latest = self.indicators.latest(&bars)?;
        let signal = self.strategy.evaluate(&latest);

        let price = Decimal::try_from(latest.close())
            .map_err(|_| DataError::ParseError(format!("unrepresentable close {}", latest.close())))?;
        let volatility = Decimal::try_from(latest.atr)
            .map_err(|_| DataError::ParseError(format!("unrepresentable ATR {}", latest.atr)))?;

        debug!(
            symbol,
            bars = bars.len(),
            sma_short = latest.sma_short,
            sma_long = latest.sma_long,
            rsi = latest.rsi,
            atr = latest.atr,
            "Enriched latest bar"
        );
        info!(symbol, %signal, %price, state = %self.machine.state(), "Signal");

        self.broker.mark_price(symbol, price);
        let transition = self
            .machine
            .step(self.broker.as_ref(), signal, price, volatility)
            .await?;

        Ok(CycleReport {
            bar_time: latest.bar.datetime(),
            signal,
            price,
            volatility,
            transition,
            state: self.machine.state(),
        })
    }
}
