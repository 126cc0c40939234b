//! Fixed-interval driver for the decision cycle.

use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};
use trailbot_core::error::TradingError;

use crate::cycle::DecisionCycle;
use crate::summary::RunSummary;

/// Runs a [`DecisionCycle`] once per interval until shut down.
///
/// Shutdown is only observed while waiting between cycles, so a cycle that
/// has started always finishes its state update.
pub struct Scheduler {
    interval: Duration,
    shutdown: watch::Receiver<bool>,
    max_cycles: Option<usize>,
}

impl Scheduler {
    /// Create a scheduler that stops once `shutdown` turns `true` or its
    /// sender is dropped.
    pub fn new(interval: Duration, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            interval,
            shutdown,
            max_cycles: None,
        }
    }

    /// Stop after `n` cycles.
    pub fn with_max_cycles(mut self, n: usize) -> Self {
        self.max_cycles = Some(n);
        self
    }

    fn shutdown_requested(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Drive the cycle until shutdown.
    ///
    /// # Errors
    /// Returns the first error whose disposition is fatal. Every other
    /// per-cycle error is logged and followed by the normal wait.
    pub async fn run(&mut self, cycle: &mut DecisionCycle) -> Result<RunSummary, TradingError> {
        let symbol = cycle.config().symbol.clone();
        let broker = cycle.broker().clone();

        let initial_equity = match tokio::time::timeout(cycle.config().call_timeout, broker.get_equity()).await {
            Ok(Ok(equity)) => Some(equity),
            Ok(Err(e)) => {
                warn!(error = %e, "Could not read starting equity");
                None
            }
            Err(_) => {
                warn!("Timed out reading starting equity");
                None
            }
        };

        let mut summary = RunSummary::new(symbol.clone(), initial_equity);
        info!(
            %symbol,
            interval_secs = self.interval.as_secs(),
            broker = broker.name(),
            "Starting decision loop"
        );

        loop {
            if self.shutdown_requested() {
                break;
            }

            match cycle.run_once().await {
                Ok(report) => {
                    summary.record(&report);
                    if let Ok(Ok(equity)) =
                        tokio::time::timeout(cycle.config().call_timeout, broker.get_equity()).await
                    {
                        summary.record_equity(report.bar_time.timestamp_millis(), equity);
                    }
                }
                Err(e) => summary.absorb(e)?,
            }

            if self.max_cycles.is_some_and(|max| summary.cycles >= max) {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                changed = self.shutdown.changed() => {
                    if changed.is_err() || self.shutdown_requested() {
                        break;
                    }
                }
            }
        }

        summary.final_state = cycle.state();
        info!(
            %symbol,
            cycles = summary.cycles,
            state = %summary.final_state,
            "Decision loop stopped"
        );

        Ok(summary)
    }
}
