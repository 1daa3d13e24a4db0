//! Source extractor: locate per-instrument records in a raw payload.
//!
//! Payload shape is resolved once, into a `Payload` variant, at ingestion:
//! - a bare array of records,
//! - an object holding an array under one of the candidate container keys
//!   (tried in caller order; first array wins),
//! - an object keyed by ticker whose values are records (the keys *are*
//!   the identities, reserved keys such as `_date` excluded),
//! - anything else, which yields no records and a structural diagnostic.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;
use thiserror::Error;

/// Reserved key carrying the snapshot timestamp in dict-of-records payloads.
pub const SNAPSHOT_DATE_KEY: &str = "_date";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StructuralError {
    #[error("payload root is {found}, expected an array or an object")]
    UnsupportedRoot { found: &'static str },

    #[error("no array under any of [{}] and no per-ticker objects", .candidates.join(", "))]
    NoRecognizableStructure { candidates: Vec<String> },

    #[error("reserved key {key} holds an unparsable timestamp: {raw}")]
    BadSnapshotDate { key: String, raw: String },
}

/// Resolved payload shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Top-level array.
    List(Vec<Value>),
    /// Array found under a container key.
    Nested { container: String, records: Vec<Value> },
    /// Object keyed by ticker, in key order.
    Keyed(Vec<(String, Value)>),
    /// No recognizable structure.
    Unrecognized,
}

impl Payload {
    pub fn len(&self) -> usize {
        match self {
            Payload::List(r) | Payload::Nested { records: r, .. } => r.len(),
            Payload::Keyed(r) => r.len(),
            Payload::Unrecognized => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn shape_name(&self) -> &'static str {
        match self {
            Payload::List(_) => "list",
            Payload::Nested { .. } => "nested",
            Payload::Keyed(_) => "keyed",
            Payload::Unrecognized => "unrecognized",
        }
    }

    /// Records paired with their map key (keyed shape only).
    pub fn records(&self) -> Box<dyn Iterator<Item = (Option<&str>, &Value)> + '_> {
        match self {
            Payload::List(r) | Payload::Nested { records: r, .. } => {
                Box::new(r.iter().map(|v| (None, v)))
            }
            Payload::Keyed(r) => Box::new(r.iter().map(|(k, v)| (Some(k.as_str()), v))),
            Payload::Unrecognized => Box::new(std::iter::empty()),
        }
    }
}

/// Extraction result: shape, optional snapshot time, structural issues.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub payload: Payload,
    pub snapshot_date: Option<DateTime<Utc>>,
    pub issues: Vec<StructuralError>,
}

impl Extraction {
    /// An extraction holding records that are already in hand.
    pub fn from_records(records: Vec<Value>) -> Self {
        Self {
            payload: Payload::List(records),
            snapshot_date: None,
            issues: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extractor {
    container_keys: Vec<String>,
    reserved_keys: Vec<String>,
}

impl Extractor {
    pub fn new<S: AsRef<str>>(container_keys: &[S]) -> Self {
        Self {
            container_keys: container_keys.iter().map(|k| k.as_ref().to_string()).collect(),
            reserved_keys: vec![SNAPSHOT_DATE_KEY.to_string()],
        }
    }

    pub fn with_reserved_keys<S: AsRef<str>>(mut self, keys: &[S]) -> Self {
        self.reserved_keys = keys.iter().map(|k| k.as_ref().to_string()).collect();
        self
    }

    pub fn container_keys(&self) -> &[String] {
        &self.container_keys
    }

    fn is_reserved(&self, key: &str) -> bool {
        self.reserved_keys.iter().any(|r| r == key)
    }

    pub fn extract(&self, payload: Value) -> Extraction {
        let mut issues = Vec::new();
        let mut snapshot_date = None;

        let payload = match payload {
            Value::Array(records) => Payload::List(records),
            Value::Object(mut map) => {
                let container = self
                    .container_keys
                    .iter()
                    .find(|k| map.get(k.as_str()).is_some_and(Value::is_array))
                    .cloned();

                if let Some(key) = container {
                    match map.remove(&key) {
                        Some(Value::Array(records)) => Payload::Nested {
                            container: key,
                            records,
                        },
                        _ => Payload::Unrecognized,
                    }
                } else {
                    let date = self
                        .is_reserved(SNAPSHOT_DATE_KEY)
                        .then(|| map.get(SNAPSHOT_DATE_KEY))
                        .flatten();
                    if let Some(raw) = date {
                        match parse_snapshot_date(raw) {
                            Some(ts) => snapshot_date = Some(ts),
                            None => issues.push(StructuralError::BadSnapshotDate {
                                key: SNAPSHOT_DATE_KEY.to_string(),
                                raw: raw.to_string(),
                            }),
                        }
                    }

                    let entries: Vec<(String, Value)> = map
                        .into_iter()
                        .filter(|(k, _)| !self.is_reserved(k))
                        .collect();

                    if entries.iter().any(|(_, v)| v.is_object()) {
                        Payload::Keyed(entries)
                    } else {
                        issues.push(StructuralError::NoRecognizableStructure {
                            candidates: self.container_keys.clone(),
                        });
                        Payload::Unrecognized
                    }
                }
            }
            other => {
                issues.push(StructuralError::UnsupportedRoot {
                    found: super::json_type_name(&other),
                });
                Payload::Unrecognized
            }
        };

        Extraction {
            payload,
            snapshot_date,
            issues,
        }
    }
}

/// List-shaped extraction: the record sequence of a bare or nested array.
///
/// Dict-of-records payloads are not a list and are reported as
/// unrecognized here; use `Extractor::extract` to handle them.
pub fn extract_records<S: AsRef<str>>(
    payload: &Value,
    candidate_keys: &[S],
) -> Result<Vec<Value>, StructuralError> {
    match payload {
        Value::Array(records) => Ok(records.clone()),
        Value::Object(map) => candidate_keys
            .iter()
            .find_map(|k| map.get(k.as_ref()).and_then(Value::as_array))
            .cloned()
            .ok_or_else(|| StructuralError::NoRecognizableStructure {
                candidates: candidate_keys.iter().map(|k| k.as_ref().to_string()).collect(),
            }),
        other => Err(StructuralError::UnsupportedRoot {
            found: super::json_type_name(other),
        }),
    }
}

/// ISO-8601 with offset, or naive (taken as UTC).
fn parse_snapshot_date(raw: &Value) -> Option<DateTime<Utc>> {
    let s = raw.as_str()?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    fn extractor() -> Extractor {
        Extractor::new(&["data", "stocks", "results"])
    }

    #[test]
    fn bare_list_is_returned_unchanged() {
        let records = json!([{"ticker": "A"}, {"ticker": "B"}]);
        let out = extractor().extract(records.clone());
        assert_eq!(out.payload, Payload::List(records.as_array().unwrap().clone()));
        assert!(out.issues.is_empty());
    }

    #[test]
    fn first_candidate_holding_an_array_wins() {
        let payload = json!({
            "data": {"not": "a list"},
            "stocks": [{"ticker": "S"}],
            "results": [{"ticker": "R"}],
        });
        match extractor().extract(payload).payload {
            Payload::Nested { container, records } => {
                assert_eq!(container, "stocks");
                assert_eq!(records, vec![json!({"ticker": "S"})]);
            }
            other => panic!("unexpected shape {other:?}"),
        }
    }

    #[test]
    fn dict_of_records_excludes_reserved_date() {
        let payload = json!({
            "ASML.AS": {"price": 700.1},
            "NKT.CO": {"price": 450.0},
            "_date": "2025-06-02T07:15:30.123456",
        });
        let out = extractor().extract(payload);
        match &out.payload {
            Payload::Keyed(entries) => {
                let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
                assert_eq!(keys, ["ASML.AS", "NKT.CO"]);
            }
            other => panic!("unexpected shape {other:?}"),
        }
        let ts = out.snapshot_date.unwrap();
        assert_eq!((ts.year(), ts.month(), ts.day()), (2025, 6, 2));
        assert_eq!((ts.hour(), ts.minute()), (7, 15));
        assert!(out.issues.is_empty());
    }

    #[test]
    fn snapshot_date_with_offset() {
        let out = extractor().extract(json!({
            "X": {}, "_date": "2025-06-02T09:00:00+02:00"
        }));
        assert_eq!(out.snapshot_date.unwrap().hour(), 7);
    }

    #[test]
    fn bad_snapshot_date_is_a_diagnostic() {
        let out = extractor().extract(json!({"X": {"price": 1}, "_date": "yesterday"}));
        assert_eq!(out.payload.len(), 1);
        assert!(matches!(
            out.issues.as_slice(),
            [StructuralError::BadSnapshotDate { .. }]
        ));
    }

    #[test]
    fn date_key_is_only_special_while_reserved() {
        let payload = json!({"X": {"price": 1}, "_date": "2025-06-02T07:15:30"});
        let out = extractor()
            .with_reserved_keys::<&str>(&[])
            .extract(payload);
        assert_eq!(out.snapshot_date, None);
        assert!(out.issues.is_empty());
        let keys: Vec<_> = out.payload.records().map(|(k, _)| k).collect();
        assert_eq!(keys, [Some("X"), Some("_date")]);

        let out = extractor()
            .with_reserved_keys(&["_meta"])
            .extract(json!({"X": {"price": 1}, "_date": "yesterday", "_meta": {}}));
        assert!(out.issues.is_empty());
        assert_eq!(out.payload.len(), 2);
    }

    #[test]
    fn unrecognized_object_yields_empty_with_diagnostic() {
        let out = extractor().extract(json!({"status": "ok", "count": 3}));
        assert_eq!(out.payload, Payload::Unrecognized);
        assert!(out.payload.is_empty());
        assert!(matches!(
            out.issues.as_slice(),
            [StructuralError::NoRecognizableStructure { .. }]
        ));
    }

    #[test]
    fn scalar_root_is_unsupported() {
        let out = extractor().extract(json!("oops"));
        assert_eq!(out.payload, Payload::Unrecognized);
        assert_eq!(
            out.issues,
            vec![StructuralError::UnsupportedRoot { found: "string" }]
        );
    }

    #[test]
    fn records_iterator_pairs_keys() {
        let out = extractor().extract(json!({"A": {"price": 1}}));
        let pairs: Vec<_> = out.payload.records().collect();
        assert_eq!(pairs, vec![(Some("A"), &json!({"price": 1}))]);
    }

    #[test]
    fn extract_records_list_contract() {
        let nested = json!({"results": [{"ticker": "A"}]});
        assert_eq!(extract_records(&nested, &["data", "results"]).unwrap().len(), 1);
        assert!(extract_records(&json!({"A": {}}), &["data"]).is_err());
        assert!(extract_records(&json!(3), &["data"]).is_err());
    }
}
