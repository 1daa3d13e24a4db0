//! Deterministic synthetic closes for development without network access.
//!
//! A random walk from 100.0 seeded by the ticker name. The numbers are
//! clearly fake; snapshots built from them are only good for wiring tests.

use super::{FetchError, PriceHistoryProvider};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use screenlab_core::indicators::PriceSeries;

#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticProvider;

impl PriceHistoryProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch_closes(&self, ticker: &str, days: u32) -> Result<PriceSeries, FetchError> {
        let seed: [u8; 32] = *blake3::hash(ticker.as_bytes()).as_bytes();
        let mut rng = StdRng::from_seed(seed);

        let mut price = 100.0_f64;
        let closes = (0..days)
            .map(|_| {
                let daily_return: f64 = rng.gen_range(-0.03..0.03);
                price *= 1.0 + daily_return;
                price
            })
            .collect();
        Ok(PriceSeries::new(closes))
    }
}
