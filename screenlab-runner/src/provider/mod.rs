//! Price history providers for the regional snapshot.
//!
//! A provider turns a ticker into a chronological closing-price series.
//! The snapshot loop never sees where the closes came from; providers are
//! swappable and mockable.

pub mod file;
pub mod synthetic;
pub mod yahoo;

pub use file::FilePriceProvider;
pub use synthetic::SyntheticProvider;
pub use yahoo::YahooProvider;

use screenlab_core::indicators::PriceSeries;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("price file error: {0}")]
    PriceFile(String),

    #[error("fetch error: {0}")]
    Other(String),
}

/// Source of closing prices.
pub trait PriceHistoryProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Closes for roughly the last `days` days, oldest first.
    fn fetch_closes(&self, ticker: &str, days: u32) -> Result<PriceSeries, FetchError>;
}
