//! Relative Strength Index (RSI).
//!
//! Wilder smoothing of average gains and average losses:
//! seed = simple mean of the first `period` gains/losses, then
//! avg = (avg * (period - 1) + current) / period.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Lookback: period.
//! Edge case: avg_loss == 0 → RSI = 100 (including a flat series).

use super::Indicator;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

/// Smoothed average gain and loss at the last close.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WilderAverages {
    pub avg_gain: f64,
    pub avg_loss: f64,
}

impl WilderAverages {
    pub fn rsi(&self) -> f64 {
        if self.avg_loss == 0.0 {
            100.0
        } else {
            100.0 - 100.0 / (1.0 + self.avg_gain / self.avg_loss)
        }
    }
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Averages after consuming the whole series, or `None` with fewer than
    /// `period + 1` closes.
    pub fn final_averages(&self, closes: &[f64]) -> Option<WilderAverages> {
        let mut last = None;
        self.walk(closes, |_, avg| last = Some(avg));
        last
    }

    /// Drive the recurrence, reporting averages at every close from index
    /// `period` onwards.
    fn walk(&self, closes: &[f64], mut emit: impl FnMut(usize, WilderAverages)) {
        let n = closes.len();
        if n < self.period + 1 {
            return;
        }

        let p = self.period as f64;
        let mut avg_gain = 0.0;
        let mut avg_loss = 0.0;
        for w in closes[..=self.period].windows(2) {
            let (gain, loss) = split(w[1] - w[0]);
            avg_gain += gain;
            avg_loss += loss;
        }
        avg_gain /= p;
        avg_loss /= p;
        emit(self.period, WilderAverages { avg_gain, avg_loss });

        for i in (self.period + 1)..n {
            let (gain, loss) = split(closes[i] - closes[i - 1]);
            avg_gain = (avg_gain * (p - 1.0) + gain) / p;
            avg_loss = (avg_loss * (p - 1.0) + loss) / p;
            emit(i, WilderAverages { avg_gain, avg_loss });
        }
    }
}

fn split(delta: f64) -> (f64, f64) {
    if delta > 0.0 {
        (delta, 0.0)
    } else if delta < 0.0 {
        (0.0, -delta)
    } else {
        (0.0, 0.0)
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, closes: &[f64]) -> Vec<f64> {
        let mut result = vec![f64::NAN; closes.len()];
        self.walk(closes, |i, avg| result[i] = avg.rsi());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_approx;

    #[test]
    fn rsi_all_gains() {
        let rsi = Rsi::new(3);
        let result = rsi.compute(&[100.0, 101.0, 102.0, 103.0, 104.0, 105.0]);
        assert_approx(result[3], 100.0, 1e-9);
        assert_approx(result[5], 100.0, 1e-9);
    }

    #[test]
    fn rsi_all_losses() {
        let rsi = Rsi::new(3);
        let result = rsi.compute(&[105.0, 104.0, 103.0, 102.0, 101.0, 100.0]);
        assert_approx(result[3], 0.0, 1e-9);
    }

    #[test]
    fn flat_series_is_100() {
        let rsi = Rsi::new(3);
        assert_eq!(rsi.latest(&[50.0; 6]), Some(100.0));
    }

    #[test]
    fn rsi_mixed_seed() {
        // Changes: +0.34, -0.25, -0.48 → avg_gain = 0.34/3, avg_loss = 0.73/3
        // RSI = 100 - 100 / (1 + 0.34/0.73) = 31.7757...
        let rsi = Rsi::new(3);
        let result = rsi.compute(&[44.0, 44.34, 44.09, 43.61]);
        assert!(result[..3].iter().all(|v| v.is_nan()));
        assert_approx(result[3], 100.0 - 100.0 / (1.0 + 0.34 / 0.73), 1e-9);
    }

    #[test]
    fn recurrence_is_wilder_not_rolling() {
        // After the seed, one big gain followed by zeros decays geometrically
        // instead of dropping out of a window.
        let closes = [10.0, 9.0, 10.0, 9.0, 19.0, 19.0, 19.0, 19.0];
        let avg = Rsi::new(3).final_averages(&closes).unwrap();
        // seed over deltas [-1, +1, -1]: gain 1/3, loss 2/3
        let mut g = 1.0 / 3.0;
        let mut l = 2.0 / 3.0;
        for delta in [10.0, 0.0, 0.0, 0.0] {
            g = (g * 2.0 + f64::max(delta, 0.0)) / 3.0;
            l = (l * 2.0) / 3.0;
        }
        assert_approx(avg.avg_gain, g, 1e-12);
        assert_approx(avg.avg_loss, l, 1e-12);
        assert!(avg.avg_loss > 0.0);
    }

    #[test]
    fn wilder_classic_example() {
        let closes = [
            44.0, 44.34, 44.09, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08, 45.89, 46.03,
            45.61, 46.28, 46.28, 46.00, 46.03, 46.41, 46.22, 45.64,
        ];
        let value = Rsi::new(14).latest(&closes).unwrap();
        assert_approx(value, 60.137168965, 1e-6);
    }

    #[test]
    fn too_short_is_all_nan() {
        let rsi = Rsi::new(14);
        let result = rsi.compute(&[1.0; 14]);
        assert!(result.iter().all(|v| v.is_nan()));
        assert_eq!(rsi.latest(&[1.0; 14]), None);
        assert!(rsi.final_averages(&[1.0; 14]).is_none());
    }

    #[test]
    fn rsi_lookback() {
        assert_eq!(Rsi::new(14).lookback(), 14);
        assert_eq!(Rsi::new(14).name(), "rsi_14");
    }
}
