//! Closes read from a local JSON file: `{"TICKER": [c0, c1, ...], ...}`.

use super::{FetchError, PriceHistoryProvider};
use screenlab_core::indicators::PriceSeries;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct FilePriceProvider {
    closes: BTreeMap<String, Vec<f64>>,
}

impl FilePriceProvider {
    pub fn from_file(path: &Path) -> Result<Self, FetchError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| FetchError::PriceFile(format!("read {}: {e}", path.display())))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, FetchError> {
        let closes = serde_json::from_str(content)
            .map_err(|e| FetchError::PriceFile(format!("parse closes: {e}")))?;
        Ok(Self { closes })
    }

    pub fn from_map(closes: BTreeMap<String, Vec<f64>>) -> Self {
        Self { closes }
    }
}

impl PriceHistoryProvider for FilePriceProvider {
    fn name(&self) -> &str {
        "file"
    }

    /// The newest `days` closes on file.
    fn fetch_closes(&self, ticker: &str, days: u32) -> Result<PriceSeries, FetchError> {
        let closes = self
            .closes
            .get(ticker)
            .ok_or_else(|| FetchError::SymbolNotFound {
                symbol: ticker.to_string(),
            })?;
        let start = closes.len().saturating_sub(days as usize);
        Ok(PriceSeries::new(closes[start..].to_vec()))
    }
}
