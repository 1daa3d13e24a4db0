//! Run manifest export (JSON).
//!
//! Records what a merge run consumed and produced: the fingerprint of every
//! input artifact, per-source counts, the output fingerprint, and every
//! diagnostic raised along the way.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use screenlab_core::emit::OutputShape;
use screenlab_core::reconcile::Diagnostic;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize)]
pub struct InputManifest {
    pub source: String,
    pub path: PathBuf,
    /// `None` when the artifact could not be read.
    pub blake3: Option<String>,
    pub records: usize,
    pub merged: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutputManifest {
    pub path: PathBuf,
    pub shape: OutputShape,
    pub blake3: String,
    pub records: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunManifest {
    pub generated_at: DateTime<Utc>,
    pub precedence: Vec<String>,
    pub inputs: Vec<InputManifest>,
    pub output: OutputManifest,
    /// Records dropped by post-merge filters.
    pub filtered: usize,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn write_manifest(path: &Path, manifest: &RunManifest) -> Result<()> {
    let json =
        serde_json::to_string_pretty(manifest).context("Failed to serialize run manifest")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write manifest to {}", path.display()))?;
    Ok(())
}
