use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Ticker identity: the sole join key across all sources.
///
/// Case and exchange suffixes are kept exactly as supplied. Two sources that
/// spell the same instrument differently produce two entries.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TickerId(String);

impl TickerId {
    /// Returns `None` for empty or whitespace-only input.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TickerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Borrow<str> for TickerId {
    fn borrow(&self) -> &str {
        &self.0
    }
}
