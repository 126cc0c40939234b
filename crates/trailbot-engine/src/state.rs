//! Position state carried between decision cycles.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a position is open, and the prices its exits are measured from.
///
/// Entry and high-water prices only exist while long, so a flat state
/// cannot carry stale values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PositionState {
    /// No open position
    #[default]
    Flat,
    /// Long since `entry_price`
    Long {
        /// Price the entry was recorded at
        entry_price: Decimal,
        /// Highest price observed since entry
        highest_price: Decimal,
    },
}

impl PositionState {
    /// Open a long position at `price`.
    pub(crate) fn long_at(price: Decimal) -> Self {
        PositionState::Long {
            entry_price: price,
            highest_price: price,
        }
    }

    /// Check if a position is open.
    pub fn in_position(&self) -> bool {
        matches!(self, PositionState::Long { .. })
    }

    /// Entry price, or zero when flat.
    pub fn entry_price(&self) -> Decimal {
        match self {
            PositionState::Flat => Decimal::ZERO,
            PositionState::Long { entry_price, .. } => *entry_price,
        }
    }

    /// High-water mark, or zero when flat.
    pub fn highest_price(&self) -> Decimal {
        match self {
            PositionState::Flat => Decimal::ZERO,
            PositionState::Long { highest_price, .. } => *highest_price,
        }
    }

    /// Raise the high-water mark to `price` if it is higher. No-op when flat.
    pub(crate) fn observe(&mut self, price: Decimal) {
        if let PositionState::Long { highest_price, .. } = self {
            *highest_price = (*highest_price).max(price);
        }
    }
}

impl fmt::Display for PositionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionState::Flat => write!(f, "FLAT"),
            PositionState::Long {
                entry_price,
                highest_price,
            } => write!(f, "LONG (entry {}, high {})", entry_price, highest_price),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_flat_reports_zero() {
        let state = PositionState::default();
        assert!(!state.in_position());
        assert_eq!(state.entry_price(), Decimal::ZERO);
        assert_eq!(state.highest_price(), Decimal::ZERO);
    }

    #[test]
    fn test_high_water_only_rises() {
        let mut state = PositionState::long_at(dec!(100));
        state.observe(dec!(110));
        state.observe(dec!(105));

        assert_eq!(state.entry_price(), dec!(100));
        assert_eq!(state.highest_price(), dec!(110));
    }

    #[test]
    fn test_observe_ignored_when_flat() {
        let mut state = PositionState::Flat;
        state.observe(dec!(110));
        assert_eq!(state, PositionState::Flat);
    }

    #[test]
    fn test_display() {
        assert_eq!(PositionState::Flat.to_string(), "FLAT");
        assert_eq!(
            PositionState::long_at(dec!(100)).to_string(),
            "LONG (entry 100, high 100)"
        );
    }
}
