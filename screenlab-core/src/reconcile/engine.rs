use super::diagnostics::{Diagnostic, DiagnosticKind, MergeReport, SourceSummary};
use super::precedence::Precedence;
use crate::data::{normalize, normalize_keyed, AliasTable, Extraction, NormalizedRecord, RecordError};
use crate::domain::{FillOutcome, MergedMap, MergedRecord};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that abort a merge. Everything else becomes a `Diagnostic`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    #[error("source precedence is empty")]
    EmptyPrecedence,

    #[error("source {0:?} appears more than once")]
    DuplicateSource(String),

    #[error("mandatory source {0:?} was not supplied")]
    MissingPrimary(String),

    #[error("source {0:?} has no rank in the precedence order")]
    UnrankedSource(String),
}

/// One source ready to merge: its extracted payload and alias table.
#[derive(Debug, Clone)]
pub struct SourceInput {
    pub name: String,
    pub table: AliasTable,
    pub extraction: Extraction,
}

impl SourceInput {
    pub fn new(name: impl Into<String>, table: AliasTable, extraction: Extraction) -> Self {
        Self {
            name: name.into(),
            table,
            extraction,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Merged {
    pub records: MergedMap,
    pub report: MergeReport,
}

#[derive(Debug, Clone)]
pub struct Reconciler {
    precedence: Precedence,
}

impl Reconciler {
    pub fn new(precedence: Precedence) -> Self {
        Self { precedence }
    }

    pub fn precedence(&self) -> &Precedence {
        &self.precedence
    }

    /// Merge every input in precedence order, whatever order they arrive in.
    pub fn merge(&self, mut inputs: Vec<SourceInput>) -> Result<Merged, MergeError> {
        for (i, input) in inputs.iter().enumerate() {
            if self.precedence.rank(&input.name).is_none() {
                return Err(MergeError::UnrankedSource(input.name.clone()));
            }
            if inputs[..i].iter().any(|other| other.name == input.name) {
                return Err(MergeError::DuplicateSource(input.name.clone()));
            }
        }
        let primary = self.precedence.primary();
        if !inputs.iter().any(|i| i.name == primary) {
            return Err(MergeError::MissingPrimary(primary.to_string()));
        }

        inputs.sort_by_key(|i| self.precedence.rank(&i.name));

        let mut records = MergedMap::new();
        let mut report = MergeReport::default();
        for input in &inputs {
            let summary = fold_source(&mut records, input, &mut report.diagnostics);
            info!(
                source = %summary.name,
                shape = summary.shape,
                records = summary.records,
                merged = summary.merged,
                created = summary.created,
                filled = summary.filled,
                skipped = summary.skipped,
                "merged source"
            );
            report.sources.push(summary);
        }

        info!(tickers = records.len(), diagnostics = report.diagnostics.len(), "merge complete");
        Ok(Merged { records, report })
    }
}

/// Fold one source into the accumulator under the fill-only rule.
///
/// The first mention of a ticker creates its entry tagged with this source.
/// Fields are only written when currently absent or null. Records that carry
/// recorded provenance (merged output read back through the canonical
/// table) keep their recorded sources instead.
pub fn fold_source(
    acc: &mut MergedMap,
    input: &SourceInput,
    diagnostics: &mut Vec<Diagnostic>,
) -> SourceSummary {
    let source = input.name.as_str();
    let payload = &input.extraction.payload;
    let mut summary = SourceSummary {
        name: input.name.clone(),
        shape: payload.shape_name(),
        records: payload.len(),
        ..Default::default()
    };

    let mut report = |kind: DiagnosticKind, locator: Option<String>, message: String| {
        warn!(source, locator = locator.as_deref().unwrap_or("-"), "{message}");
        diagnostics.push(Diagnostic {
            source: source.to_string(),
            kind,
            locator,
            message,
        });
    };

    for issue in &input.extraction.issues {
        report(DiagnosticKind::Structural, None, issue.to_string());
    }

    for (index, (key, raw)) in payload.records().enumerate() {
        let locator = key.map_or_else(|| format!("#{index}"), str::to_string);

        let normalized = match key {
            Some(k) => normalize_keyed(k, raw, &input.table),
            None => normalize(raw, &input.table),
        };
        let NormalizedRecord {
            identity,
            attributes,
            warnings,
            origin,
            field_origins,
        } = match normalized {
            Ok(n) => n,
            Err(e) => {
                report(DiagnosticKind::Record, Some(locator), e.to_string());
                summary.skipped += 1;
                continue;
            }
        };
        let Some(identity) = identity else {
            let e = RecordError::MissingIdentity {
                tried: input.table.identity_keys.clone(),
            };
            report(DiagnosticKind::Record, Some(locator), e.to_string());
            summary.skipped += 1;
            continue;
        };

        for w in warnings {
            report(
                DiagnosticKind::Field,
                Some(identity.to_string()),
                format!("{} (alias {:?}): {}", w.field, w.alias, w.error),
            );
        }

        let origin = origin.as_deref().unwrap_or(source);
        let entry = acc.entry(identity.clone()).or_insert_with(|| {
            summary.created += 1;
            MergedRecord::new(identity.clone(), origin)
        });
        for (field, value) in attributes.iter() {
            let field_origin = field_origins.get(&field).map_or(origin, String::as_str);
            match entry.fill(field, value, field_origin) {
                FillOutcome::Filled => summary.filled += 1,
                FillOutcome::Conflict => {
                    summary.conflicts += 1;
                    debug!(
                        source,
                        ticker = %identity,
                        field = field.as_str(),
                        kept = %entry.get(field).cloned().unwrap_or_default(),
                        dropped = %value,
                        "kept higher-precedence value"
                    );
                }
                FillOutcome::Unchanged => {}
            }
        }
        summary.merged += 1;
    }

    summary
}
