//! Record normalizer: one raw record in, identity plus canonical attributes out.

use super::aliases::AliasTable;
use super::coerce::{coerce, CoerceError};
use crate::domain::{AttributeSet, Field, TickerId};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("record is {found}, not an object")]
    NotAnObject { found: &'static str },

    #[error("record has no identity under any of [{}]", .tried.join(", "))]
    MissingIdentity { tried: Vec<String> },

    #[error("record key {key:?} is not a usable ticker")]
    BlankKey { key: String },
}

/// A field value that could not be coerced; the field resolves as null.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldWarning {
    pub field: Field,
    pub alias: String,
    pub error: CoerceError,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    /// `None` when no identity key is present; callers skip such records.
    pub identity: Option<TickerId>,
    pub attributes: AttributeSet,
    pub warnings: Vec<FieldWarning>,
    /// Creating source recorded in merged output, if the table reads one.
    pub origin: Option<String>,
    /// Per-field sources recorded in merged output.
    pub field_origins: BTreeMap<Field, String>,
}

/// Normalize a list-shaped record: identity comes from the record itself.
pub fn normalize(record: &Value, table: &AliasTable) -> Result<NormalizedRecord, RecordError> {
    let map = as_object(record)?;
    let identity = table.resolve_identity(map);
    let (attributes, warnings) = resolve_attributes(map, table);
    let (origin, field_origins) = table.resolve_origins(map);
    Ok(NormalizedRecord {
        identity,
        attributes,
        warnings,
        origin,
        field_origins,
    })
}

/// Normalize a dict-of-records entry: the map key is the identity.
pub fn normalize_keyed(
    key: &str,
    record: &Value,
    table: &AliasTable,
) -> Result<NormalizedRecord, RecordError> {
    let map = as_object(record)?;
    let identity = TickerId::new(key).ok_or_else(|| RecordError::BlankKey {
        key: key.to_string(),
    })?;
    let (attributes, warnings) = resolve_attributes(map, table);
    let (origin, field_origins) = table.resolve_origins(map);
    Ok(NormalizedRecord {
        identity: Some(identity),
        attributes,
        warnings,
        origin,
        field_origins,
    })
}

fn as_object(record: &Value) -> Result<&Map<String, Value>, RecordError> {
    record.as_object().ok_or(RecordError::NotAnObject {
        found: super::json_type_name(record),
    })
}

/// Per field, the first alias with a non-null coerced value wins. If every
/// present alias is null (or uncoercible) the field is present-but-null;
/// if no alias is present the field is absent.
fn resolve_attributes(
    map: &Map<String, Value>,
    table: &AliasTable,
) -> (AttributeSet, Vec<FieldWarning>) {
    let mut attributes = AttributeSet::new();
    let mut warnings = Vec::new();

    for field in table.fields() {
        let mut seen = false;
        let mut resolved = None;

        for alias in table.aliases(field) {
            let Some(raw) = map.get(alias) else {
                continue;
            };
            seen = true;
            match coerce(field.kind(), raw) {
                Ok(Value::Null) => {}
                Ok(value) => {
                    resolved = Some(value);
                    break;
                }
                Err(error) => warnings.push(FieldWarning {
                    field,
                    alias: alias.clone(),
                    error,
                }),
            }
        }

        match resolved {
            Some(value) => attributes.insert(field, value),
            None if seen => attributes.insert(field, Value::Null),
            None => {}
        }
    }

    (attributes, warnings)
}
