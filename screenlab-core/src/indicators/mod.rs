//! Indicator calculator: percent-change and RSI over a closing-price series.
//!
//! Indicators are pure functions over an already-materialized series. The
//! series form (`Indicator::compute`) yields one value per close with `NaN`
//! during warmup; snapshot producers only need the final value, which
//! `IndicatorConfig::evaluate` rounds to 2 decimal places.

pub mod percent_change;
pub mod rsi;
pub mod series;

pub use percent_change::PercentChange;
pub use rsi::{Rsi, WilderAverages};
pub use series::PriceSeries;

use serde::{Deserialize, Serialize};

/// Default RSI lookback.
pub const DEFAULT_RSI_PERIOD: usize = 14;

/// Default oversold threshold (RSI strictly below this is oversold).
pub const DEFAULT_OVERSOLD_THRESHOLD: f64 = 32.0;

/// Trait for indicators computed over a closing-price series.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "rsi_14").
    fn name(&self) -> &str;

    /// Number of closes needed before the first valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for every close.
    ///
    /// Returns a `Vec<f64>` of the same length as `closes`; the first
    /// `lookback()` values are `f64::NAN`.
    fn compute(&self, closes: &[f64]) -> Vec<f64>;

    /// Value at the last close, if defined.
    fn latest(&self, closes: &[f64]) -> Option<f64> {
        self.compute(closes)
            .last()
            .copied()
            .filter(|v| v.is_finite())
    }
}

/// Indicator policy: RSI lookback and oversold classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub period: usize,
    pub oversold_threshold: f64,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            period: DEFAULT_RSI_PERIOD,
            oversold_threshold: DEFAULT_OVERSOLD_THRESHOLD,
        }
    }
}

/// Indicators for one instrument at one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorResult {
    pub percent_change: Option<f64>,
    pub rsi: Option<f64>,
    pub oversold: bool,
}

impl IndicatorConfig {
    /// Percent-change and RSI at the last close, rounded to 2 decimal places.
    ///
    /// RSI is `None` unless the series holds at least `period + 1` closes.
    /// A zero period has no RSI at all.
    pub fn evaluate(&self, series: &PriceSeries) -> IndicatorResult {
        let closes = series.as_slice();
        let percent_change = PercentChange.latest(closes).map(round2);
        let rsi = if self.period > 0 && closes.len() > self.period {
            Rsi::new(self.period).latest(closes).map(round2)
        } else {
            None
        };
        IndicatorResult {
            percent_change,
            rsi,
            oversold: self.is_oversold(rsi),
        }
    }

    pub fn is_oversold(&self, rsi: Option<f64>) -> bool {
        rsi.is_some_and(|r| r < self.oversold_threshold)
    }
}

/// Round half away from zero to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}
