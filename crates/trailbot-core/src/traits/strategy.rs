//! Signal generator trait definition.

use crate::types::{EnrichedBar, Signal};

/// Turns the latest enriched bar into a discrete signal.
///
/// Implementations are pure: no history beyond what the derived fields
/// already encode, and the same bar always yields the same signal.
pub trait SignalGenerator: Send + Sync {
    /// Get the unique name of this generator.
    fn name(&self) -> &str;

    /// Evaluate the latest bar.
    fn evaluate(&self, bar: &EnrichedBar) -> Signal;

    /// Get a description of the rule.
    fn description(&self) -> &str {
        ""
    }
}
