//! Regional snapshot producer.
//!
//! For every instrument in the universe: fetch recent closes, compute
//! percent-change and RSI, and record the result next to the universe
//! metadata. Instruments are independent, so the loop runs on a private
//! rayon pool. A failed fetch never aborts the batch; that instrument keeps
//! its metadata and portfolio flag with null market fields.

use crate::provider::PriceHistoryProvider;
use crate::universe::{Portfolio, Universe, UniverseEntry};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use screenlab_core::data::SNAPSHOT_DATE_KEY;
use screenlab_core::indicators::{round2, IndicatorConfig};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to build snapshot worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// One instrument in the regional artifact.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEntry {
    pub name: String,
    pub country: String,
    pub sector: String,
    pub price: Option<f64>,
    pub percent_change: Option<f64>,
    pub rsi: Option<f64>,
    pub oversold: bool,
    pub in_portfolio: bool,
}

impl SnapshotEntry {
    fn unpriced(meta: &UniverseEntry, in_portfolio: bool) -> Self {
        Self {
            name: meta.name.clone(),
            country: meta.country.clone(),
            sector: meta.sector.clone(),
            price: None,
            percent_change: None,
            rsi: None,
            oversold: false,
            in_portfolio,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotFailure {
    pub ticker: String,
    pub error: String,
}

/// Snapshot of the whole universe at one instant.
///
/// Serializes as a mapping ticker → entry in universe order, followed by
/// the reserved `_date` key.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub date: DateTime<Utc>,
    pub entries: Vec<(String, SnapshotEntry)>,
    pub failures: Vec<SnapshotFailure>,
}

impl Snapshot {
    pub fn get(&self, ticker: &str) -> Option<&SnapshotEntry> {
        self.entries
            .iter()
            .find(|(t, _)| t == ticker)
            .map(|(_, e)| e)
    }

    /// Naive ISO-8601 UTC timestamp with microseconds.
    pub fn date_string(&self) -> String {
        self.date.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len() + 1))?;
        for (ticker, entry) in &self.entries {
            map.serialize_entry(ticker, entry)?;
        }
        map.serialize_entry(SNAPSHOT_DATE_KEY, &self.date_string())?;
        map.end()
    }
}

pub struct SnapshotBuilder<'a> {
    provider: &'a dyn PriceHistoryProvider,
    policy: IndicatorConfig,
    history_days: u32,
    threads: usize,
}

impl<'a> SnapshotBuilder<'a> {
    pub fn new(provider: &'a dyn PriceHistoryProvider, policy: IndicatorConfig) -> Self {
        Self {
            provider,
            policy,
            history_days: crate::config::DEFAULT_HISTORY_DAYS,
            threads: 1,
        }
    }

    pub fn history_days(mut self, days: u32) -> Self {
        self.history_days = days;
        self
    }

    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    pub fn build(&self, universe: &Universe, portfolio: &Portfolio) -> Result<Snapshot, SnapshotError> {
        self.build_at(universe, portfolio, Utc::now())
    }

    /// Build with an explicit timestamp.
    pub fn build_at(
        &self,
        universe: &Universe,
        portfolio: &Portfolio,
        date: DateTime<Utc>,
    ) -> Result<Snapshot, SnapshotError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .build()?;

        info!(
            provider = self.provider.name(),
            instruments = universe.len(),
            threads = self.threads,
            "building regional snapshot"
        );

        let results: Vec<(String, SnapshotEntry, Option<String>)> = pool.install(|| {
            universe
                .entries()
                .par_iter()
                .map(|meta| self.instrument(meta, portfolio.contains(&meta.ticker)))
                .collect()
        });

        let mut entries = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for (ticker, entry, error) in results {
            if let Some(error) = error {
                failures.push(SnapshotFailure {
                    ticker: ticker.clone(),
                    error,
                });
            }
            entries.push((ticker, entry));
        }

        info!(
            instruments = entries.len(),
            failed = failures.len(),
            "snapshot complete"
        );
        Ok(Snapshot {
            date,
            entries,
            failures,
        })
    }

    fn instrument(
        &self,
        meta: &UniverseEntry,
        in_portfolio: bool,
    ) -> (String, SnapshotEntry, Option<String>) {
        let ticker = meta.ticker.clone();
        match self.provider.fetch_closes(&ticker, self.history_days) {
            Ok(series) => {
                let result = self.policy.evaluate(&series);
                debug!(ticker = %ticker, closes = series.len(), rsi = ?result.rsi, "evaluated");
                let entry = SnapshotEntry {
                    name: meta.name.clone(),
                    country: meta.country.clone(),
                    sector: meta.sector.clone(),
                    price: series.last().map(round2),
                    percent_change: result.percent_change,
                    rsi: result.rsi,
                    oversold: result.oversold,
                    in_portfolio,
                };
                (ticker, entry, None)
            }
            Err(e) => {
                warn!(ticker = %ticker, error = %e, "price fetch failed");
                let entry = SnapshotEntry::unpriced(meta, in_portfolio);
                (ticker, entry, Some(e.to_string()))
            }
        }
    }
}

/// Write the snapshot as pretty JSON, creating parent directories.
pub fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(snapshot).context("failed to serialize snapshot")?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write snapshot to {}", path.display()))?;
    Ok(())
}
