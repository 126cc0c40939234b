//! Volatility indicators.

use trailbot_core::traits::BarIndicator;
use trailbot_core::types::Bar;

/// Average True Range (ATR).
///
/// Measures market volatility by decomposing the entire range
/// of an asset price for that period.
#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
}

impl Atr {
    /// Create a new ATR indicator.
    ///
    /// Common period is 14.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }

    /// Wilder's smoothing seeded with the simple mean of the first window.
    fn smooth(tr: &[f64], period: usize) -> Vec<f64> {
        if tr.len() < period {
            return vec![];
        }

        let period_f64 = period as f64;
        let mut result = Vec::with_capacity(tr.len() - period + 1);

        let mut atr: f64 = tr[..period].iter().sum::<f64>() / period_f64;
        result.push(atr);

        for &tr_val in &tr[period..] {
            atr = (atr * (period_f64 - 1.0) + tr_val) / period_f64;
            result.push(atr);
        }

        result
    }
}

impl BarIndicator for Atr {
    type Output = f64;

    fn calculate(&self, bars: &[Bar]) -> Vec<f64> {
        if bars.len() < self.period + 1 {
            return vec![];
        }

        let tr: Vec<f64> = bars
            .windows(2)
            .map(|w| w[1].true_range(Some(w[0].close)))
            .collect();

        Self::smooth(&tr, self.period)
    }

    fn period(&self) -> usize {
        self.period + 1
    }

    fn name(&self) -> &str {
        "ATR"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atr_seeded_with_mean_true_range() {
        let atr = Atr::new(3);
        // True ranges from the second bar on: 2, 3, 4, 5, 6
        let bars: Vec<Bar> = (0..6)
            .map(|i| {
                let span = (i + 1) as f64;
                Bar::new(i, 100.0, 100.0 + span / 2.0, 100.0 - span / 2.0, 100.0, 1.0)
            })
            .collect();

        let result = BarIndicator::calculate(&atr, &bars);

        // One value per bar from index `period` on
        assert_eq!(result.len(), bars.len() - atr.period() + 1);
        assert!((result[0] - 3.0).abs() < 1e-10);
        assert!((result[1] - (3.0 * 2.0 + 5.0) / 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_atr_short_history_is_empty() {
        let atr = Atr::new(3);
        let bars: Vec<Bar> = (0..3)
            .map(|i| Bar::new(i, 100.0, 101.0, 99.0, 100.0, 1.0))
            .collect();
        assert!(BarIndicator::calculate(&atr, &bars).is_empty());
    }

    #[test]
    fn test_atr_constant_range() {
        let atr = Atr::new(2);
        // Every bar spans 2.0 and closes where the next opens
        let bars: Vec<Bar> = (0..5)
            .map(|i| Bar::new(i, 100.0, 101.0, 99.0, 100.0, 1.0))
            .collect();

        let result = BarIndicator::calculate(&atr, &bars);
        assert_eq!(result.len(), 4 - 2 + 1);
        assert!(result.iter().all(|v| (*v - 2.0).abs() < 1e-10));
    }

    #[test]
    fn test_atr_gap_uses_previous_close() {
        let atr = Atr::new(1);
        let bars = vec![
            Bar::new(0, 100.0, 101.0, 99.0, 100.0, 1.0),
            // Gap up: high - prev_close = 10 beats high - low = 2
            Bar::new(1, 108.0, 110.0, 108.0, 109.0, 1.0),
        ];

        let result = BarIndicator::calculate(&atr, &bars);
        assert_eq!(result, vec![10.0]);
    }
}
