//! Decision loop for a single traded symbol.
//!
//! - [`PositionStateMachine`] owns the FLAT/LONG state and talks to the broker
//! - [`DecisionCycle`] runs fetch → enrich → signal → state machine once
//! - [`Scheduler`] repeats the cycle every bar interval until shutdown
//! - [`ReplayEngine`] walks recorded bars through the same cycle

mod cycle;
mod machine;
mod replay;
mod scheduler;
mod state;
mod summary;

pub use cycle::{CycleConfig, CycleReport, DecisionCycle};
pub use machine::{PositionStateMachine, Transition};
pub use replay::{ReplayConfig, ReplayEngine, ReplayReport, ReplaySource};
pub use scheduler::Scheduler;
pub use state::PositionState;
pub use summary::{RunSummary, TradeEvent};
