//! Source payload ingestion: shape extraction, alias resolution, coercion.

pub mod aliases;
pub mod coerce;
pub mod extract;
pub mod normalize;

pub use aliases::{AliasTable, SourceKind, DEFAULT_IDENTITY_KEYS};
pub use coerce::{coerce, parse_number, CoerceError};
pub use extract::{extract_records, Extraction, Extractor, Payload, StructuralError, SNAPSHOT_DATE_KEY};
pub use normalize::{normalize, normalize_keyed, FieldWarning, NormalizedRecord, RecordError};

use serde_json::Value;

/// JSON type name for diagnostics.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
