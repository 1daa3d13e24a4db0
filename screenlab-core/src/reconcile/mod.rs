//! Reconciliation engine: fold normalized records from every source into one
//! record per ticker.
//!
//! Sources are merged in an explicit precedence order. The first source in
//! that order is mandatory and creates the baseline entries; every later
//! source may only fill fields that are still absent or null. A non-null
//! value, once written, is never replaced.

pub mod diagnostics;
pub mod engine;
pub mod precedence;

pub use diagnostics::{Diagnostic, DiagnosticKind, MergeReport, SourceSummary};
pub use engine::{MergeError, Merged, Reconciler, SourceInput};
pub use precedence::Precedence;
