//! Indicator trait definitions.

use crate::types::Bar;

/// Indicator over a close series.
///
/// Output is aligned to the end of the input: one value per position from
/// `data[period() - 1]` onward, so `n` inputs give `n - period() + 1`
/// outputs and nothing at all when `n < period()`.
pub trait Indicator: Send + Sync {
    type Output;

    /// Compute the fully-warmed values for `data`.
    fn calculate(&self, data: &[f64]) -> Vec<Self::Output>;

    /// Inputs needed before the first value.
    fn period(&self) -> usize;

    fn name(&self) -> &str;
}

/// Indicator that needs the full bar (high/low/close), not just the close.
pub trait BarIndicator: Send + Sync {
    type Output;

    /// Compute values from bars, aligned like [`Indicator::calculate`].
    fn calculate(&self, bars: &[Bar]) -> Vec<Self::Output>;

    /// Bars needed before the first value.
    fn period(&self) -> usize;

    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Echoes the close each window ends on.
    struct LastOf(usize);

    impl Indicator for LastOf {
        type Output = f64;

        fn calculate(&self, data: &[f64]) -> Vec<f64> {
            data.iter().skip(self.0.saturating_sub(1)).copied().collect()
        }

        fn period(&self) -> usize {
            self.0
        }

        fn name(&self) -> &str {
            "last"
        }
    }

    #[test]
    fn test_alignment_contract() {
        let closes = [10.0, 11.0, 12.0, 13.0, 14.0];
        let last = LastOf(3);

        let out = last.calculate(&closes);

        assert_eq!(out.len(), closes.len() - last.period() + 1);
        assert_eq!(out[0], closes[last.period() - 1]);
        assert_eq!(*out.last().unwrap(), *closes.last().unwrap());
    }
}
