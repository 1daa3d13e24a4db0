//! Canonical attribute names understood by the merge engine.
//!
//! The first thirteen variants are the core screener/sentiment/regional
//! attributes. The remainder are carried by richer producers (scanner
//! columns, sentiment cards) and merge under the same rules.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How a raw value for a field is coerced during normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Number,
    Text,
    Flag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Name,
    Price,
    PercentChange,
    Volume,
    Rsi,
    Pe,
    Sector,
    DividendYield,
    Mentions,
    Sentiment,
    Oversold,
    Country,
    InPortfolio,
    MarketCap,
    AvgVolume,
    RelVolume,
    AnalystRating,
    BullishPercent,
    BearishPercent,
    Earnings,
    CallToPutOiRatio,
    ThirtyDayIv,
    OptionActivity7d,
}

impl Field {
    /// Every canonical field, in emission order.
    pub const ALL: [Field; 23] = [
        Field::Name,
        Field::Price,
        Field::PercentChange,
        Field::Volume,
        Field::Rsi,
        Field::Pe,
        Field::Sector,
        Field::DividendYield,
        Field::Mentions,
        Field::Sentiment,
        Field::Oversold,
        Field::Country,
        Field::InPortfolio,
        Field::MarketCap,
        Field::AvgVolume,
        Field::RelVolume,
        Field::AnalystRating,
        Field::BullishPercent,
        Field::BearishPercent,
        Field::Earnings,
        Field::CallToPutOiRatio,
        Field::ThirtyDayIv,
        Field::OptionActivity7d,
    ];

    /// Canonical (output) name.
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Price => "price",
            Field::PercentChange => "percentChange",
            Field::Volume => "volume",
            Field::Rsi => "rsi",
            Field::Pe => "pe",
            Field::Sector => "sector",
            Field::DividendYield => "dividendYield",
            Field::Mentions => "mentions",
            Field::Sentiment => "sentiment",
            Field::Oversold => "oversold",
            Field::Country => "country",
            Field::InPortfolio => "inPortfolio",
            Field::MarketCap => "marketCap",
            Field::AvgVolume => "avgVolume",
            Field::RelVolume => "relVolume",
            Field::AnalystRating => "analystRating",
            Field::BullishPercent => "bullishPercent",
            Field::BearishPercent => "bearishPercent",
            Field::Earnings => "earnings",
            Field::CallToPutOiRatio => "callToPutOiRatio",
            Field::ThirtyDayIv => "thirtyDayIv",
            Field::OptionActivity7d => "optionActivity7d",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            Field::Name | Field::Sector | Field::Country | Field::AnalystRating | Field::Earnings => {
                FieldKind::Text
            }
            Field::Oversold | Field::InPortfolio => FieldKind::Flag,
            _ => FieldKind::Number,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown canonical field: {0}")]
pub struct UnknownField(pub String);

impl FromStr for Field {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}
