//! Run summary accumulated across cycles.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use trailbot_core::error::TradingError;
use trailbot_core::{Disposition, Side};
use trailbot_risk::ExitReason;

use crate::cycle::CycleReport;
use crate::machine::Transition;
use crate::state::PositionState;

/// An order the run placed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeEvent {
    /// Bar the decision was made on
    pub bar_time: DateTime<Utc>,
    /// Order side
    pub side: Side,
    /// Reference price (latest close)
    pub price: Decimal,
    /// Notional for entries, quantity for exits
    pub amount: Decimal,
    /// Exit reason, for sells
    pub reason: Option<ExitReason>,
}

/// Counters and equity history for a run of decision cycles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    /// Traded symbol
    pub symbol: String,
    /// Cycles started, including failed ones
    pub cycles: usize,
    /// Long positions opened
    pub entries: usize,
    /// BUY signals that sized to zero or failed sizing
    pub skipped_entries: usize,
    /// Exits on the take-profit target
    pub take_profit_exits: usize,
    /// Exits on the trailing stop
    pub trailing_stop_exits: usize,
    /// Exits where the broker already had no position
    pub missing_exits: usize,
    /// Cycles skipped for lack of usable data
    pub skipped_cycles: usize,
    /// Cycles that hit a transient gateway failure
    pub retried_cycles: usize,
    /// First bar seen
    pub first_bar: Option<DateTime<Utc>>,
    /// Last bar seen
    pub last_bar: Option<DateTime<Utc>>,
    /// Last observed close
    pub last_price: Option<Decimal>,
    /// Position state at the end of the run
    pub final_state: PositionState,
    /// Equity before the first cycle
    pub initial_equity: Option<Decimal>,
    /// Equity after the last cycle
    pub final_equity: Option<Decimal>,
    /// Largest peak-to-trough equity drop, in percent
    pub max_drawdown_pct: Decimal,
    /// Orders placed
    pub trades: Vec<TradeEvent>,
    /// (bar timestamp ms, equity) after each cycle
    pub equity_curve: Vec<(i64, Decimal)>,
    #[serde(skip)]
    peak_equity: Decimal,
}

impl RunSummary {
    /// Create an empty summary.
    pub fn new(symbol: impl Into<String>, initial_equity: Option<Decimal>) -> Self {
        Self {
            symbol: symbol.into(),
            initial_equity,
            final_equity: initial_equity,
            peak_equity: initial_equity.unwrap_or(Decimal::ZERO),
            ..Default::default()
        }
    }

    /// Record a completed cycle.
    pub fn record(&mut self, report: &CycleReport) {
        self.cycles += 1;
        self.first_bar.get_or_insert(report.bar_time);
        self.last_bar = Some(report.bar_time);
        self.last_price = Some(report.price);
        self.final_state = report.state;

        match &report.transition {
            Transition::Entered { notional, .. } => {
                self.entries += 1;
                self.trades.push(TradeEvent {
                    bar_time: report.bar_time,
                    side: Side::Buy,
                    price: report.price,
                    amount: *notional,
                    reason: None,
                });
            }
            Transition::EntrySkipped { .. } => self.skipped_entries += 1,
            Transition::Exited {
                reason, quantity, ..
            } => {
                match reason {
                    ExitReason::TakeProfit => self.take_profit_exits += 1,
                    ExitReason::TrailingStop => self.trailing_stop_exits += 1,
                }
                self.trades.push(TradeEvent {
                    bar_time: report.bar_time,
                    side: Side::Sell,
                    price: report.price,
                    amount: *quantity,
                    reason: Some(*reason),
                });
            }
            Transition::ExitedMissing { .. } => self.missing_exits += 1,
            Transition::Idle | Transition::Held { .. } => {}
        }
    }

    /// Record a failed cycle and decide whether the run continues.
    ///
    /// # Errors
    /// Returns the error back when its disposition is fatal.
    pub fn absorb(&mut self, err: TradingError) -> Result<(), TradingError> {
        self.cycles += 1;

        match err.disposition() {
            Disposition::SkipCycle => {
                self.skipped_cycles += 1;
                warn!(symbol = %self.symbol, error = %err, "Skipping cycle");
            }
            Disposition::SkipEntry => {
                self.skipped_entries += 1;
                warn!(symbol = %self.symbol, error = %err, "Skipping entry");
            }
            Disposition::Retry => {
                self.retried_cycles += 1;
                error!(symbol = %self.symbol, error = %err, "Gateway failure, retrying next cycle");
            }
            Disposition::Fatal => {
                error!(symbol = %self.symbol, error = %err, "Unrecoverable error");
                return Err(err);
            }
        }

        Ok(())
    }

    /// Record account equity after a cycle.
    pub fn record_equity(&mut self, timestamp: i64, equity: Decimal) {
        self.equity_curve.push((timestamp, equity));
        self.final_equity = Some(equity);

        if equity > self.peak_equity {
            self.peak_equity = equity;
        }
        if self.peak_equity > Decimal::ZERO {
            let drawdown = (self.peak_equity - equity) / self.peak_equity * dec!(100);
            if drawdown > self.max_drawdown_pct {
                self.max_drawdown_pct = drawdown;
            }
        }
    }

    /// Total exits of either kind, including missing positions.
    pub fn exits(&self) -> usize {
        self.take_profit_exits + self.trailing_stop_exits + self.missing_exits
    }

    /// Return over the run in percent, if both equities are known.
    pub fn total_return_pct(&self) -> Option<Decimal> {
        match (self.initial_equity, self.final_equity) {
            (Some(initial), Some(last)) if initial > Decimal::ZERO => {
                Some((last - initial) / initial * dec!(100))
            }
            _ => None,
        }
    }

    /// Generate a text summary.
    pub fn summary(&self) -> String {
        let mut s = String::new();
        let money = |v: Option<Decimal>| match v {
            Some(v) => format!("${:.2}", v),
            None => "n/a".to_string(),
        };

        s.push_str("═══════════════════════════════════════════════════════════\n");
        s.push_str(&format!("                  RUN SUMMARY: {:<20}        \n", self.symbol));
        s.push_str("═══════════════════════════════════════════════════════════\n\n");

        s.push_str("PERFORMANCE\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!("  Initial Equity:      {}\n", money(self.initial_equity)));
        s.push_str(&format!("  Final Equity:        {}\n", money(self.final_equity)));
        match self.total_return_pct() {
            Some(pct) => s.push_str(&format!("  Total Return:        {:.2}%\n", pct)),
            None => s.push_str("  Total Return:        n/a\n"),
        }
        s.push_str(&format!(
            "  Max Drawdown:        {:.2}%\n",
            self.max_drawdown_pct
        ));
        s.push('\n');

        s.push_str("TRADES\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!("  Entries:             {}\n", self.entries));
        s.push_str(&format!("  Skipped Entries:     {}\n", self.skipped_entries));
        s.push_str(&format!("  Take-Profit Exits:   {}\n", self.take_profit_exits));
        s.push_str(&format!("  Trailing-Stop Exits: {}\n", self.trailing_stop_exits));
        s.push_str(&format!("  Missing Positions:   {}\n", self.missing_exits));
        s.push_str(&format!("  Final State:         {}\n", self.final_state));
        s.push('\n');

        s.push_str("EXECUTION\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!("  Cycles:              {}\n", self.cycles));
        s.push_str(&format!("  Skipped Cycles:      {}\n", self.skipped_cycles));
        s.push_str(&format!("  Retried Cycles:      {}\n", self.retried_cycles));
        if let (Some(first), Some(last)) = (self.first_bar, self.last_bar) {
            s.push_str(&format!("  First Bar:           {}\n", first.format("%Y-%m-%d %H:%M")));
            s.push_str(&format!("  Last Bar:            {}\n", last.format("%Y-%m-%d %H:%M")));
        }
        s.push('\n');

        s.push_str("═══════════════════════════════════════════════════════════\n");

        s
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trailbot_core::error::{BrokerError, DataError, SizingError};
    use trailbot_core::Signal;
    use uuid::Uuid;

    fn report(transition: Transition, state: PositionState) -> CycleReport {
        CycleReport {
            bar_time: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            signal: Signal::Hold,
            price: dec!(100),
            volatility: dec!(1),
            transition,
            state,
        }
    }

    #[test]
    fn test_counts_transitions() {
        let mut summary = RunSummary::new("ETH/USD", Some(dec!(10000)));

        summary.record(&report(
            Transition::Entered {
                price: dec!(100),
                notional: dec!(500),
                order_id: Uuid::new_v4(),
            },
            PositionState::Flat,
        ));
        summary.record(&report(
            Transition::Exited {
                reason: ExitReason::TrailingStop,
                price: dec!(100),
                quantity: dec!(5),
                order_id: Uuid::new_v4(),
            },
            PositionState::Flat,
        ));
        summary.record(&report(
            Transition::ExitedMissing {
                reason: ExitReason::TakeProfit,
            },
            PositionState::Flat,
        ));
        summary.record(&report(Transition::Idle, PositionState::Flat));

        assert_eq!(summary.cycles, 4);
        assert_eq!(summary.entries, 1);
        assert_eq!(summary.trailing_stop_exits, 1);
        assert_eq!(summary.missing_exits, 1);
        assert_eq!(summary.exits(), 2);
        assert_eq!(summary.trades.len(), 2);
        assert_eq!(summary.trades[1].reason, Some(ExitReason::TrailingStop));
    }

    #[test]
    fn test_absorb_by_disposition() {
        let mut summary = RunSummary::new("ETH/USD", None);

        assert!(summary.absorb(DataError::NoDataAvailable.into()).is_ok());
        assert!(summary
            .absorb(SizingError::DegenerateVolatility(Decimal::ZERO).into())
            .is_ok());
        assert!(summary
            .absorb(BrokerError::Unavailable("down".into()).into())
            .is_ok());
        assert!(summary
            .absorb(BrokerError::AuthenticationError("bad key".into()).into())
            .is_err());

        assert_eq!(summary.cycles, 4);
        assert_eq!(summary.skipped_cycles, 1);
        assert_eq!(summary.skipped_entries, 1);
        assert_eq!(summary.retried_cycles, 1);
    }

    #[test]
    fn test_drawdown_and_return() {
        let mut summary = RunSummary::new("ETH/USD", Some(dec!(10000)));
        summary.record_equity(1, dec!(11000));
        summary.record_equity(2, dec!(9900));
        summary.record_equity(3, dec!(10500));

        assert_eq!(summary.max_drawdown_pct, dec!(10));
        assert_eq!(summary.total_return_pct(), Some(dec!(5)));
        assert_eq!(summary.final_equity, Some(dec!(10500)));
    }

    #[test]
    fn test_summary_text() {
        let mut summary = RunSummary::new("ETH/USD", Some(dec!(10000)));
        summary.record_equity(1, dec!(11000));

        let text = summary.summary();
        assert!(text.contains("RUN SUMMARY: ETH/USD"));
        assert!(text.contains("Total Return:        10.00%"));
        assert!(text.contains("Final State:         FLAT"));
    }
}
