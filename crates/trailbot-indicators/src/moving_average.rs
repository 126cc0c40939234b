//! Moving average indicators.

use trailbot_core::traits::Indicator;

/// Simple Moving Average (SMA).
///
/// Calculates the arithmetic mean of the last N values.
#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
}

impl Sma {
    /// Create a new SMA with the specified period.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }
}

impl Indicator for Sma {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        let n = self.period;
        if data.len() < n {
            return vec![];
        }

        let width = n as f64;
        let seed: f64 = data[..n].iter().sum();

        // Slide the window one value at a time: add the newest, drop the oldest
        std::iter::once(seed)
            .chain(data[n..].iter().zip(data).scan(seed, |sum, (incoming, outgoing)| {
                *sum += incoming - outgoing;
                Some(*sum)
            }))
            .map(|sum| sum / width)
            .collect()
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "SMA"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window_mean(window: &[f64]) -> f64 {
        window.iter().sum::<f64>() / window.len() as f64
    }

    #[test]
    fn test_output_k_averages_window_ending_at_period_minus_one_plus_k() {
        let sma = Sma::new(4);
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + ((i * 7) % 11) as f64).collect();

        let out = sma.calculate(&closes);

        assert_eq!(out.len(), closes.len() - sma.period() + 1);
        for (k, value) in out.iter().enumerate() {
            let end = sma.period() - 1 + k;
            let expected = window_mean(&closes[end + 1 - sma.period()..=end]);
            assert!((value - expected).abs() < 1e-9, "k = {}", k);
        }
    }

    #[test]
    fn test_short_input_yields_nothing() {
        let sma = Sma::new(20);
        assert!(sma.calculate(&[101.0; 19]).is_empty());
        assert_eq!(sma.calculate(&[101.0; 20]), vec![101.0]);
    }

    #[test]
    fn test_running_sum_does_not_drift() {
        let sma = Sma::new(50);
        let closes: Vec<f64> = (0..5000).map(|i| 2000.0 + (i as f64 * 0.37).sin() * 25.0).collect();

        let out = sma.calculate(&closes);
        let last = window_mean(&closes[closes.len() - 50..]);
        assert!((out[out.len() - 1] - last).abs() < 1e-6);
    }
}
