//! Non-fatal problems collected during a merge, plus per-source counts.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Payload shape not recognized; the source contributed nothing.
    Structural,
    /// A record was skipped.
    Record,
    /// A field value could not be coerced and was treated as null.
    Field,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub source: String,
    pub kind: DiagnosticKind,
    /// Record position or map key, when the problem is record-scoped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locator: Option<String>,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            DiagnosticKind::Structural => "structural",
            DiagnosticKind::Record => "record",
            DiagnosticKind::Field => "field",
        };
        match &self.locator {
            Some(loc) => write!(f, "[{}] {kind} {loc}: {}", self.source, self.message),
            None => write!(f, "[{}] {kind}: {}", self.source, self.message),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SourceSummary {
    pub name: String,
    pub shape: &'static str,
    /// Records found in the payload.
    pub records: usize,
    /// Records that reached the accumulator.
    pub merged: usize,
    /// Records skipped (malformed or without identity).
    pub skipped: usize,
    /// Tickers first introduced by this source.
    pub created: usize,
    /// Field writes (absent/null → value).
    pub filled: usize,
    /// Incoming non-null values that disagreed with an existing value and were dropped.
    pub conflicts: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergeReport {
    pub sources: Vec<SourceSummary>,
    pub diagnostics: Vec<Diagnostic>,
}

impl MergeReport {
    pub fn source(&self, name: &str) -> Option<&SourceSummary> {
        self.sources.iter().find(|s| s.name == name)
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics.iter().filter(|d| d.kind == kind).count()
    }

    pub fn skipped(&self) -> usize {
        self.sources.iter().map(|s| s.skipped).sum()
    }
}
