//! ScreenLab Runner: pipeline orchestration on top of `screenlab-core`.
//!
//! This crate provides:
//! - TOML pipeline configuration (sources, precedence, indicators, output)
//! - Artifact loading with BLAKE3 fingerprints
//! - The merge run: load, reconcile, filter, emit, manifest
//! - The regional snapshot producer on a bounded rayon pool
//! - Price history providers (Yahoo chart API, local file, synthetic)
//! - Tracing initialisation for binaries

pub mod config;
pub mod loader;
pub mod manifest;
pub mod pipeline;
pub mod provider;
pub mod snapshot;
pub mod telemetry;
pub mod universe;

pub use config::{
    ConfigError, FilterConfig, IndicatorSettings, OutputConfig, PipelineConfig, ProviderKind,
    SnapshotConfig, SourceConfig,
};
pub use loader::{load_artifact, LoadError, LoadedArtifact};
pub use manifest::{InputManifest, OutputManifest, RunManifest};
pub use pipeline::{
    apply_min_market_cap, merge_sources, run_merge, run_snapshot, MergeRun, MergedSources,
    SnapshotRun,
};
pub use provider::{FetchError, PriceHistoryProvider};
pub use snapshot::{Snapshot, SnapshotBuilder, SnapshotEntry, SnapshotError};
pub use universe::{Portfolio, Universe, UniverseEntry, UniverseError};
