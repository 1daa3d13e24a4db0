use super::{Field, TickerId};
use serde_json::Value;
use std::collections::BTreeMap;

/// Output key naming the source that created a merged record.
pub const SOURCE_KEY: &str = "source";

/// Output key holding per-field provenance.
pub const FIELD_SOURCES_KEY: &str = "fieldSources";

/// Canonical attributes resolved from one record.
///
/// A missing key means the source never mentioned the field. A key holding
/// `Value::Null` means the source explicitly encoded "no value".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeSet {
    values: BTreeMap<Field, Value>,
}

impl AttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: Field, value: Value) {
        self.values.insert(field, value);
    }

    pub fn get(&self, field: Field) -> Option<&Value> {
        self.values.get(&field)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.values.contains_key(&field)
    }

    /// Present and not null.
    pub fn is_filled(&self, field: Field) -> bool {
        self.values.get(&field).is_some_and(|v| !v.is_null())
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &Value)> {
        self.values.iter().map(|(f, v)| (*f, v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(Field, Value)> for AttributeSet {
    fn from_iter<I: IntoIterator<Item = (Field, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// What a fill attempt did to a merged field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillOutcome {
    /// Field was absent or null and now holds the incoming value.
    Filled,
    /// Nothing to do: incoming value is null, or equal to the current one.
    Unchanged,
    /// Field already held a different non-null value, which was kept.
    Conflict,
}

/// One entry of the merged output.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRecord {
    pub ticker: TickerId,
    /// Source that first mentioned this ticker.
    pub source: String,
    attributes: AttributeSet,
    field_sources: BTreeMap<Field, String>,
}

impl MergedRecord {
    pub fn new(ticker: TickerId, source: impl Into<String>) -> Self {
        Self {
            ticker,
            source: source.into(),
            attributes: AttributeSet::new(),
            field_sources: BTreeMap::new(),
        }
    }

    /// Fill-only write: a non-null value is never replaced.
    pub fn fill(&mut self, field: Field, value: &Value, source: &str) -> FillOutcome {
        match self.attributes.get(field) {
            Some(current) if !current.is_null() => {
                if value.is_null() || current == value {
                    FillOutcome::Unchanged
                } else {
                    FillOutcome::Conflict
                }
            }
            Some(_) if value.is_null() => FillOutcome::Unchanged,
            _ => {
                self.attributes.insert(field, value.clone());
                if !value.is_null() {
                    self.field_sources.insert(field, source.to_string());
                }
                FillOutcome::Filled
            }
        }
    }

    pub fn get(&self, field: Field) -> Option<&Value> {
        self.attributes.get(field)
    }

    pub fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    /// Source that supplied the current non-null value of `field`.
    pub fn field_source(&self, field: Field) -> Option<&str> {
        self.field_sources.get(&field).map(|s| s.as_str())
    }

    pub fn field_sources(&self) -> impl Iterator<Item = (Field, &str)> {
        self.field_sources.iter().map(|(f, s)| (*f, s.as_str()))
    }
}

/// Merged output keyed by ticker, iterated in ascending ticker order.
pub type MergedMap = BTreeMap<TickerId, MergedRecord>;
