//! Alias tables: where each source keeps its identity and attributes.
//!
//! Field-name drift between sources is data, not code. Each source type has
//! a table mapping canonical fields to an ordered list of source keys; the
//! first key holding a non-null value wins. Adding an alias means editing a
//! table (or a config override), never adding a code path.

use crate::domain::{Field, TickerId, FIELD_SOURCES_KEY, SOURCE_KEY};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Identity keys tried in order when a table does not override them.
pub const DEFAULT_IDENTITY_KEYS: [&str; 4] = ["ticker", "symbol", "s", "name"];

/// Built-in table selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Screener feed: prices, fundamentals, scanner columns.
    Primary,
    /// Retail-sentiment feed: mentions, sentiment score, option cards.
    Sentiment,
    /// Regional snapshot produced by the indicator calculator.
    Regional,
    /// Every canonical field under its own name (re-reading merged output).
    Canonical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasTable {
    #[serde(default = "default_identity_keys")]
    pub identity_keys: Vec<String>,
    #[serde(default)]
    pub fields: BTreeMap<Field, Vec<String>>,
    /// Key naming the source a record was first seen in, when the payload
    /// is itself merged output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_key: Option<String>,
    /// Key holding a field -> source mapping, alongside `origin_key`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_origins_key: Option<String>,
}

fn default_identity_keys() -> Vec<String> {
    DEFAULT_IDENTITY_KEYS.iter().map(|k| k.to_string()).collect()
}

fn table(entries: &[(Field, &[&str])]) -> AliasTable {
    AliasTable {
        identity_keys: default_identity_keys(),
        fields: entries
            .iter()
            .map(|(field, keys)| (*field, keys.iter().map(|k| k.to_string()).collect()))
            .collect(),
        origin_key: None,
        field_origins_key: None,
    }
}

impl AliasTable {
    pub fn for_kind(kind: SourceKind) -> Self {
        match kind {
            SourceKind::Primary => Self::primary(),
            SourceKind::Sentiment => Self::sentiment(),
            SourceKind::Regional => Self::regional(),
            SourceKind::Canonical => Self::canonical(),
        }
    }

    pub fn primary() -> Self {
        table(&[
            (Field::Name, &["name", "description"]),
            (Field::Price, &["price", "close"]),
            (Field::PercentChange, &["percentChange", "change"]),
            (Field::Volume, &["volume"]),
            (Field::Rsi, &["rsi", "RSI", "rsi14"]),
            (Field::Pe, &["pe", "price_earnings_ttm", "peRatio", "peRatioTV"]),
            (Field::Sector, &["sector", "sector.tr"]),
            (
                Field::DividendYield,
                &["dividendYield", "dividends_yield_current", "divYieldTTM"],
            ),
            (Field::Country, &["country"]),
            (Field::MarketCap, &["marketCap", "market_cap_basic"]),
            (Field::AvgVolume, &["avgVolume", "average_volume_10d_calc"]),
            (Field::RelVolume, &["relVolume", "relative_volume_10d_calc"]),
            (Field::AnalystRating, &["analystRating", "Recommend.All"]),
        ])
    }

    pub fn sentiment() -> Self {
        table(&[
            (Field::Mentions, &["mentions", "mention_count"]),
            (Field::Sentiment, &["sentiment", "sentiment_score"]),
            (Field::BullishPercent, &["bullishPercent", "bullish_percent"]),
            (Field::BearishPercent, &["bearishPercent", "bearish_percent"]),
            (Field::Earnings, &["earnings"]),
            (Field::MarketCap, &["market_cap", "marketCap"]),
            (Field::CallToPutOiRatio, &["call_to_put_oi_ratio"]),
            (Field::ThirtyDayIv, &["thirty_day_iv"]),
            (Field::OptionActivity7d, &["option_activity_7d"]),
        ])
    }

    pub fn regional() -> Self {
        table(&[
            (Field::Name, &["name"]),
            (Field::Country, &["country"]),
            (Field::Sector, &["sector"]),
            (Field::Price, &["price"]),
            (Field::PercentChange, &["percentChange"]),
            (Field::Rsi, &["rsi"]),
            (Field::Oversold, &["oversold"]),
            (Field::InPortfolio, &["inPortfolio"]),
        ])
    }

    pub fn canonical() -> Self {
        AliasTable {
            identity_keys: default_identity_keys(),
            fields: Field::ALL
                .iter()
                .map(|f| (*f, vec![f.as_str().to_string()]))
                .collect(),
            origin_key: Some(SOURCE_KEY.to_string()),
            field_origins_key: Some(FIELD_SOURCES_KEY.to_string()),
        }
    }

    /// Replace the alias list of each overridden field.
    pub fn with_overrides(mut self, overrides: &BTreeMap<Field, Vec<String>>) -> Self {
        for (field, keys) in overrides {
            self.fields.insert(*field, keys.clone());
        }
        self
    }

    pub fn with_identity_keys(mut self, keys: Vec<String>) -> Self {
        self.identity_keys = keys;
        self
    }

    pub fn aliases(&self, field: Field) -> &[String] {
        self.fields.get(&field).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Fields this table can produce.
    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.fields.keys().copied()
    }

    /// Recorded provenance of a merged-output record: the creating source
    /// and the per-field sources. Empty for tables without origin keys.
    pub fn resolve_origins(
        &self,
        record: &Map<String, Value>,
    ) -> (Option<String>, BTreeMap<Field, String>) {
        let origin = self
            .origin_key
            .as_ref()
            .and_then(|key| record.get(key))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let field_origins: BTreeMap<Field, String> = self
            .field_origins_key
            .as_ref()
            .and_then(|key| record.get(key))
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .filter_map(|(k, v)| Some((k.parse::<Field>().ok()?, v.as_str()?.to_string())))
                    .collect()
            })
            .unwrap_or_default();
        (origin, field_origins)
    }

    /// First identity key holding a non-blank string.
    pub fn resolve_identity(&self, record: &Map<String, Value>) -> Option<TickerId> {
        self.identity_keys.iter().find_map(|key| match record.get(key) {
            Some(Value::String(s)) => TickerId::new(s.as_str()),
            _ => None,
        })
    }
}
