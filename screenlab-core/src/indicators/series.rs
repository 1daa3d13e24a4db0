use serde::{Deserialize, Serialize};

/// Chronological closing prices for one instrument.
///
/// Non-finite closes are dropped at construction; the series is read-only
/// afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<f64>", into = "Vec<f64>")]
pub struct PriceSeries(Vec<f64>);

impl PriceSeries {
    pub fn new(closes: Vec<f64>) -> Self {
        Self(closes.into_iter().filter(|c| c.is_finite()).collect())
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<f64> {
        self.0.last().copied()
    }
}

impl From<Vec<f64>> for PriceSeries {
    fn from(closes: Vec<f64>) -> Self {
        Self::new(closes)
    }
}

impl From<PriceSeries> for Vec<f64> {
    fn from(series: PriceSeries) -> Self {
        series.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_non_finite_closes() {
        let s = PriceSeries::new(vec![1.0, f64::NAN, 2.0, f64::INFINITY, 3.0]);
        assert_eq!(s.as_slice(), &[1.0, 2.0, 3.0]);
        assert_eq!(s.last(), Some(3.0));
    }

    #[test]
    fn deserializes_from_array() {
        let s: PriceSeries = serde_json::from_str("[10.0, 10.5]").unwrap();
        assert_eq!(s.len(), 2);
    }
}
