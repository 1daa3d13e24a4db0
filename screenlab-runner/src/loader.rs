//! Artifact loading.
//!
//! Reads a source artifact from disk, parses it as JSON, and fingerprints
//! the raw bytes. A missing or unparsable artifact is a `LoadError`; the
//! pipeline decides whether that aborts the run (mandatory source) or
//! degrades to a diagnostic (secondary sources).

use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not valid JSON: {source}", .path.display())]
    Unparsable {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A parsed artifact plus its provenance.
#[derive(Debug, Clone)]
pub struct LoadedArtifact {
    pub path: PathBuf,
    pub payload: Value,
    /// BLAKE3 of the raw bytes, hex encoded.
    pub hash: String,
    pub bytes: usize,
}

pub fn load_artifact(path: &Path) -> Result<LoadedArtifact, LoadError> {
    let raw = std::fs::read(path).map_err(|source| LoadError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let payload = serde_json::from_slice(&raw).map_err(|source| LoadError::Unparsable {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(LoadedArtifact {
        path: path.to_path_buf(),
        payload,
        hash: hash_bytes(&raw),
        bytes: raw.len(),
    })
}

/// Hex BLAKE3 digest.
pub fn hash_bytes(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}
