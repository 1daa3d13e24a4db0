//! Merged-record emitter.
//!
//! Every record carries the complete canonical schema so downstream
//! consumers see a stable set of keys: `ticker`, each canonical field
//! (absent fields as `null`), `source`, and optionally `fieldSources`.

use crate::domain::{Field, MergedMap, MergedRecord, FIELD_SOURCES_KEY, SOURCE_KEY};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmitError {
    #[error("failed to serialize merged output: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Top-level shape of the persisted artifact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputShape {
    /// JSON object keyed by ticker.
    #[default]
    Mapping,
    /// JSON array of records in ticker order.
    List,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Emitter {
    pub shape: OutputShape,
    pub field_provenance: bool,
}

impl Emitter {
    pub fn new(shape: OutputShape) -> Self {
        Self {
            shape,
            field_provenance: false,
        }
    }

    pub fn with_field_provenance(mut self, enabled: bool) -> Self {
        self.field_provenance = enabled;
        self
    }

    /// Serializable view of the merged map in this emitter's shape.
    pub fn view<'a>(&self, records: &'a MergedMap) -> MergedView<'a> {
        MergedView {
            records,
            emitter: *self,
        }
    }

    pub fn to_value(&self, records: &MergedMap) -> Result<Value, EmitError> {
        Ok(serde_json::to_value(self.view(records))?)
    }

    /// Pretty-printed JSON, key order preserved.
    pub fn to_pretty_string(&self, records: &MergedMap) -> Result<String, EmitError> {
        Ok(serde_json::to_string_pretty(&self.view(records))?)
    }
}

pub struct MergedView<'a> {
    records: &'a MergedMap,
    emitter: Emitter,
}

impl Serialize for MergedView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let provenance = self.emitter.field_provenance;
        match self.emitter.shape {
            OutputShape::Mapping => {
                let mut map = serializer.serialize_map(Some(self.records.len()))?;
                for (ticker, record) in self.records {
                    map.serialize_entry(ticker.as_str(), &RecordView { record, provenance })?;
                }
                map.end()
            }
            OutputShape::List => {
                let mut seq = serializer.serialize_seq(Some(self.records.len()))?;
                for record in self.records.values() {
                    seq.serialize_element(&RecordView { record, provenance })?;
                }
                seq.end()
            }
        }
    }
}

struct RecordView<'a> {
    record: &'a MergedRecord,
    provenance: bool,
}

impl Serialize for RecordView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let r = self.record;
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("ticker", r.ticker.as_str())?;
        for field in Field::ALL {
            map.serialize_entry(field.as_str(), r.get(field).unwrap_or(&Value::Null))?;
        }
        map.serialize_entry(SOURCE_KEY, &r.source)?;
        if self.provenance {
            map.serialize_entry(FIELD_SOURCES_KEY, &FieldSources(r))?;
        }
        map.end()
    }
}

struct FieldSources<'a>(&'a MergedRecord);

impl Serialize for FieldSources<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (field, source) in self.0.field_sources() {
            map.serialize_entry(field.as_str(), source)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TickerId;
    use serde_json::json;

    fn sample() -> MergedMap {
        let mut map = MergedMap::new();
        for (ticker, price) in [("BBB", json!(20)), ("AAA", json!(10))] {
            let id = TickerId::new(ticker).unwrap();
            let mut r = MergedRecord::new(id.clone(), "primary");
            r.fill(Field::Price, &price, "primary");
            r.fill(Field::Rsi, &Value::Null, "primary");
            map.insert(id, r);
        }
        map
    }

    #[test]
    fn mapping_shape_has_complete_schema() {
        let v = Emitter::new(OutputShape::Mapping).to_value(&sample()).unwrap();
        let aaa = v["AAA"].as_object().unwrap();
        assert_eq!(aaa.len(), Field::ALL.len() + 2);
        assert_eq!(aaa["ticker"], json!("AAA"));
        assert_eq!(aaa["price"], json!(10));
        assert_eq!(aaa["rsi"], Value::Null);
        assert_eq!(aaa["mentions"], Value::Null);
        assert_eq!(aaa["source"], json!("primary"));
        assert!(!aaa.contains_key("fieldSources"));
    }

    #[test]
    fn list_shape_is_in_ticker_order() {
        let v = Emitter::new(OutputShape::List).to_value(&sample()).unwrap();
        let tickers: Vec<&str> = v
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["ticker"].as_str().unwrap())
            .collect();
        assert_eq!(tickers, ["AAA", "BBB"]);
    }

    #[test]
    fn pretty_output_keeps_key_order() {
        let text = Emitter::default().to_pretty_string(&sample()).unwrap();
        assert!(text.find("\"AAA\"").unwrap() < text.find("\"BBB\"").unwrap());
        let ticker = text.find("\"ticker\"").unwrap();
        let name = text.find("\"name\"").unwrap();
        let source = text.find("\"source\"").unwrap();
        assert!(ticker < name && name < source);
        assert!(text.contains("\n  \"AAA\": {\n    \"ticker\": \"AAA\""));
    }

    #[test]
    fn field_provenance_is_opt_in() {
        let v = Emitter::new(OutputShape::Mapping)
            .with_field_provenance(true)
            .to_value(&sample())
            .unwrap();
        assert_eq!(v["AAA"]["fieldSources"], json!({"price": "primary"}));
    }

    #[test]
    fn shape_names_deserialize() {
        let s: OutputShape = serde_json::from_value(json!("list")).unwrap();
        assert_eq!(s, OutputShape::List);
        assert_eq!(OutputShape::default(), OutputShape::Mapping);
    }

    #[test]
    fn empty_map_emits_empty_container() {
        let empty = MergedMap::new();
        assert_eq!(Emitter::default().to_pretty_string(&empty).unwrap(), "{}");
        assert_eq!(
            Emitter::new(OutputShape::List).to_pretty_string(&empty).unwrap(),
            "[]"
        );
    }
}
