//! One-step percent change.
//!
//! pct[t] = (close[t] - close[t-1]) / close[t-1] * 100
//! Lookback: 1. Undefined when the previous close is zero.

use super::Indicator;

#[derive(Debug, Clone, Copy, Default)]
pub struct PercentChange;

impl Indicator for PercentChange {
    fn name(&self) -> &str {
        "pct_change"
    }

    fn lookback(&self) -> usize {
        1
    }

    fn compute(&self, closes: &[f64]) -> Vec<f64> {
        let mut result = vec![f64::NAN; closes.len()];
        for i in 1..closes.len() {
            let prev = closes[i - 1];
            if prev != 0.0 {
                result[i] = (closes[i] - prev) / prev * 100.0;
            }
        }
        result
    }
}
