//! Merge and snapshot runs driven by a `PipelineConfig`.
//!
//! Merge: load every configured artifact, extract and reconcile them in
//! precedence order, apply post-merge filters, emit the merged artifact and
//! optionally a run manifest. Only the mandatory (first-ranked) source is
//! required; any other artifact that cannot be read becomes a structural
//! diagnostic and the merge goes on without it.

use crate::config::{ConfigError, PipelineConfig, ProviderKind};
use crate::loader::{hash_bytes, load_artifact};
use crate::manifest::{write_manifest, InputManifest, OutputManifest, RunManifest};
use crate::provider::{FilePriceProvider, PriceHistoryProvider, SyntheticProvider, YahooProvider};
use crate::snapshot::{write_snapshot, Snapshot, SnapshotBuilder};
use crate::universe::{Portfolio, Universe};
use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use screenlab_core::data::Extraction;
use screenlab_core::domain::{Field, MergedMap};
use screenlab_core::reconcile::{
    Diagnostic, DiagnosticKind, MergeReport, Reconciler, SourceInput,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Outcome of a merge run.
#[derive(Debug, Clone)]
pub struct MergeRun {
    pub records: MergedMap,
    pub report: MergeReport,
    pub inputs: Vec<InputManifest>,
    /// Records dropped by the market-cap filter.
    pub filtered: usize,
    pub output: PathBuf,
    pub output_hash: String,
    pub manifest: Option<PathBuf>,
}

/// Reconciled records before anything is written.
#[derive(Debug, Clone)]
pub struct MergedSources {
    pub records: MergedMap,
    pub report: MergeReport,
    pub inputs: Vec<InputManifest>,
    pub filtered: usize,
}

/// Load, reconcile and filter without writing anything.
pub fn merge_sources(config: &PipelineConfig) -> Result<MergedSources> {
    config.validate().context("invalid pipeline config")?;
    let precedence = config.precedence()?;
    let primary = precedence.primary().to_string();

    let mut inputs = Vec::with_capacity(config.sources.len());
    let mut fingerprints = Vec::with_capacity(config.sources.len());
    let mut load_diagnostics = Vec::new();

    for source in &config.sources {
        let (extraction, hash) = match load_artifact(&source.path) {
            Ok(artifact) => {
                info!(
                    source = %source.name,
                    path = %artifact.path.display(),
                    bytes = artifact.bytes,
                    "loaded artifact"
                );
                (source.extractor().extract(artifact.payload), Some(artifact.hash))
            }
            Err(e) if source.name == primary => {
                return Err(anyhow!(e)
                    .context(format!("mandatory source '{}' is unavailable", source.name)));
            }
            Err(e) => {
                warn!(source = %source.name, error = %e, "secondary source unavailable");
                load_diagnostics.push(Diagnostic {
                    source: source.name.clone(),
                    kind: DiagnosticKind::Structural,
                    locator: None,
                    message: e.to_string(),
                });
                (Extraction::from_records(Vec::new()), None)
            }
        };
        fingerprints.push((source.name.clone(), source.path.clone(), hash));
        inputs.push(SourceInput::new(source.name.clone(), source.alias_table(), extraction));
    }

    let merged = Reconciler::new(precedence).merge(inputs)?;
    let mut records = merged.records;
    let mut report = merged.report;
    load_diagnostics.append(&mut report.diagnostics);
    report.diagnostics = load_diagnostics;

    let filtered = match config.filters.min_market_cap {
        Some(min) => apply_min_market_cap(&mut records, min),
        None => 0,
    };

    let inputs = fingerprints
        .into_iter()
        .map(|(name, path, blake3)| {
            let summary = report.source(&name);
            InputManifest {
                records: summary.map_or(0, |s| s.records),
                merged: summary.map_or(0, |s| s.merged),
                skipped: summary.map_or(0, |s| s.skipped),
                source: name,
                path,
                blake3,
            }
        })
        .collect();

    Ok(MergedSources {
        records,
        report,
        inputs,
        filtered,
    })
}

/// Full merge run: reconcile, write the merged artifact and the manifest.
pub fn run_merge(config: &PipelineConfig) -> Result<MergeRun> {
    let MergedSources {
        records,
        report,
        inputs,
        filtered,
    } = merge_sources(config)?;

    let text = config
        .output
        .emitter()
        .to_pretty_string(&records)
        .context("failed to emit merged output")?;
    let output = config.output.path.clone();
    write_text(&output, &text)?;
    let output_hash = hash_bytes(text.as_bytes());
    info!(path = %output.display(), records = records.len(), "wrote merged output");

    if let Some(path) = &config.output.manifest {
        let manifest = RunManifest {
            generated_at: Utc::now(),
            precedence: config.precedence.clone(),
            inputs: inputs.clone(),
            output: OutputManifest {
                path: output.clone(),
                shape: config.output.shape,
                blake3: output_hash.clone(),
                records: records.len(),
            },
            filtered,
            diagnostics: report.diagnostics.clone(),
        };
        write_manifest(path, &manifest)?;
    }

    Ok(MergeRun {
        records,
        report,
        inputs,
        filtered,
        output,
        output_hash,
        manifest: config.output.manifest.clone(),
    })
}

/// Drop records whose market cap is a number below `min`.
///
/// Records with an absent or null market cap are kept.
pub fn apply_min_market_cap(records: &mut MergedMap, min: f64) -> usize {
    let before = records.len();
    records.retain(|_, r| {
        r.get(Field::MarketCap)
            .and_then(|v| v.as_f64())
            .map_or(true, |cap| cap >= min)
    });
    let removed = before - records.len();
    if removed > 0 {
        info!(removed, min_market_cap = min, "filtered small caps");
    }
    removed
}

/// Outcome of a snapshot run.
#[derive(Debug, Clone)]
pub struct SnapshotRun {
    pub snapshot: Snapshot,
    pub output: PathBuf,
}

/// Build the regional snapshot with the configured provider and write it.
pub fn run_snapshot(config: &PipelineConfig) -> Result<SnapshotRun> {
    config.validate().context("invalid pipeline config")?;
    let snap_cfg = &config.snapshot;
    snap_cfg.validate().context("invalid snapshot config")?;

    let universe = Universe::from_file(&snap_cfg.universe)?;
    let portfolio: Portfolio = snap_cfg.portfolio.iter().cloned().collect();
    let provider: Box<dyn PriceHistoryProvider> = match snap_cfg.provider {
        ProviderKind::Yahoo => Box::new(YahooProvider::new()?),
        ProviderKind::File => {
            let path = snap_cfg
                .prices
                .as_deref()
                .ok_or(ConfigError::MissingPricesPath)?;
            Box::new(FilePriceProvider::from_file(path)?)
        }
        ProviderKind::Synthetic => {
            warn!("generating synthetic closes; snapshot values are not market data");
            Box::new(SyntheticProvider)
        }
    };

    let snapshot = SnapshotBuilder::new(provider.as_ref(), config.indicators.policy())
        .history_days(config.indicators.history_days)
        .threads(snap_cfg.thread_count())
        .build(&universe, &portfolio)?;
    write_snapshot(&snap_cfg.output, &snapshot)?;

    Ok(SnapshotRun {
        snapshot,
        output: snap_cfg.output.clone(),
    })
}

fn write_text(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use screenlab_core::domain::{MergedRecord, TickerId};
    use serde_json::json;

    fn record(ticker: &str, cap: serde_json::Value) -> (TickerId, MergedRecord) {
        let id = TickerId::new(ticker).unwrap();
        let mut r = MergedRecord::new(id.clone(), "primary");
        r.fill(Field::MarketCap, &cap, "primary");
        (id, r)
    }

    #[test]
    fn market_cap_filter_keeps_unknown_caps() {
        let mut records: MergedMap = [
            record("BIG", json!(5.0e9)),
            record("EDGE", json!(100_000_000)),
            record("TINY", json!(2.0e7)),
            record("NULL", serde_json::Value::Null),
        ]
        .into_iter()
        .collect();
        records.insert(
            TickerId::new("NONE").unwrap(),
            MergedRecord::new(TickerId::new("NONE").unwrap(), "primary"),
        );

        let removed = apply_min_market_cap(&mut records, 1.0e8);
        assert_eq!(removed, 1);
        let left: Vec<&str> = records.keys().map(|t| t.as_str()).collect();
        assert_eq!(left, ["BIG", "EDGE", "NONE", "NULL"]);
    }
}
