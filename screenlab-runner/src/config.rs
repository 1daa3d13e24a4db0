//! Serializable pipeline configuration (TOML).
//!
//! One file describes the whole run: which sources exist and where they
//! live, the order in which they are trusted, the indicator policy used by
//! the regional snapshot, and the shape of the merged artifact.

use screenlab_core::data::{AliasTable, Extractor, SourceKind, SNAPSHOT_DATE_KEY};
use screenlab_core::domain::Field;
use screenlab_core::emit::{Emitter, OutputShape};
use screenlab_core::indicators::{IndicatorConfig, DEFAULT_OVERSOLD_THRESHOLD, DEFAULT_RSI_PERIOD};
use screenlab_core::reconcile::{MergeError, Precedence};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Trading days of history requested per instrument.
pub const DEFAULT_HISTORY_DAYS: u32 = 21;

/// Upper bound on snapshot worker threads when none is configured.
pub const MAX_DEFAULT_THREADS: usize = 8;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid precedence: {0}")]
    Precedence(#[from] MergeError),

    #[error("source {0:?} is configured but has no rank in precedence")]
    UnrankedSource(String),

    #[error("source {0:?} is configured more than once")]
    DuplicateSource(String),

    #[error("mandatory source {0:?} has no [[sources]] entry")]
    MissingPrimary(String),

    #[error("indicator period must be at least 1")]
    ZeroPeriod,

    #[error("oversold threshold {0} is outside [0, 100]")]
    ThresholdOutOfRange(f64),

    #[error("snapshot provider 'file' needs a prices path")]
    MissingPricesPath,
}

/// One input artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    /// Built-in alias table to start from.
    pub kind: SourceKind,
    pub path: PathBuf,
    #[serde(default)]
    pub container_keys: Vec<String>,
    #[serde(default = "default_reserved_keys")]
    pub reserved_keys: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_keys: Option<Vec<String>>,
    /// Per-field alias lists replacing the built-in ones.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub aliases: BTreeMap<Field, Vec<String>>,
}

fn default_reserved_keys() -> Vec<String> {
    vec![SNAPSHOT_DATE_KEY.to_string()]
}

impl SourceConfig {
    pub fn new(
        name: impl Into<String>,
        kind: SourceKind,
        path: impl Into<PathBuf>,
        container_keys: &[&str],
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            path: path.into(),
            container_keys: container_keys.iter().map(|k| k.to_string()).collect(),
            reserved_keys: default_reserved_keys(),
            identity_keys: None,
            aliases: BTreeMap::new(),
        }
    }

    /// Built-in table for `kind` with this source's overrides applied.
    pub fn alias_table(&self) -> AliasTable {
        let table = AliasTable::for_kind(self.kind).with_overrides(&self.aliases);
        match &self.identity_keys {
            Some(keys) => table.with_identity_keys(keys.clone()),
            None => table,
        }
    }

    pub fn extractor(&self) -> Extractor {
        Extractor::new(self.container_keys.as_slice())
            .with_reserved_keys(self.reserved_keys.as_slice())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorSettings {
    pub period: usize,
    pub oversold_threshold: f64,
    pub history_days: u32,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        Self {
            period: DEFAULT_RSI_PERIOD,
            oversold_threshold: DEFAULT_OVERSOLD_THRESHOLD,
            history_days: DEFAULT_HISTORY_DAYS,
        }
    }
}

impl IndicatorSettings {
    pub fn policy(&self) -> IndicatorConfig {
        IndicatorConfig {
            period: self.period,
            oversold_threshold: self.oversold_threshold,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub shape: OutputShape,
    #[serde(default)]
    pub field_provenance: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("combined_output.json"),
            shape: OutputShape::Mapping,
            field_provenance: false,
            manifest: None,
        }
    }
}

impl OutputConfig {
    pub fn emitter(&self) -> Emitter {
        Emitter::new(self.shape).with_field_provenance(self.field_provenance)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Drop merged records whose market cap is known and below this value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_market_cap: Option<f64>,
}

/// Where the regional snapshot gets its closes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[default]
    Yahoo,
    File,
    /// Seeded random walk, developer use only.
    Synthetic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    pub universe: PathBuf,
    pub output: PathBuf,
    pub portfolio: Vec<String>,
    pub provider: ProviderKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prices: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            universe: PathBuf::from("sentiment/eu_tickers.csv"),
            output: PathBuf::from("sentiment/eu_snapshot.json"),
            portfolio: [
                "NOVO-B.CO", "ASML.AS", "NKT.CO", "ALV.DE", "BESI.AS", "ORSTED.CO", "EVO.ST",
                "TEP.PA", "RELX.AS",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            provider: ProviderKind::Yahoo,
            prices: None,
            threads: None,
        }
    }
}

impl SnapshotConfig {
    /// Checks that only matter to snapshot runs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider == ProviderKind::File && self.prices.is_none() {
            return Err(ConfigError::MissingPricesPath);
        }
        Ok(())
    }

    /// Configured thread count, or available parallelism capped at 8.
    pub fn thread_count(&self) -> usize {
        self.threads.filter(|&n| n > 0).unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
                .min(MAX_DEFAULT_THREADS)
        })
    }
}

/// Complete configuration for `merge` and `snapshot` runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Source names from most to least trusted; the first is mandatory.
    pub precedence: Vec<String>,
    pub sources: Vec<SourceConfig>,
    #[serde(default)]
    pub indicators: IndicatorSettings,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub filters: FilterConfig,
    #[serde(default)]
    pub snapshot: SnapshotConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            precedence: Precedence::standard().names().to_vec(),
            sources: vec![
                SourceConfig::new(
                    "primary",
                    SourceKind::Primary,
                    "warrensoutputfile.json",
                    &["data", "stocks", "results"],
                ),
                SourceConfig::new(
                    "sentiment",
                    SourceKind::Sentiment,
                    "sentiment/swaggystocks_sentiment.json",
                    &["data", "tickers", "sentiment"],
                ),
                SourceConfig::new(
                    "regional",
                    SourceKind::Regional,
                    "sentiment/eu_snapshot.json",
                    &[],
                ),
            ],
            indicators: IndicatorSettings::default(),
            output: OutputConfig::default(),
            filters: FilterConfig::default(),
            snapshot: SnapshotConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let precedence = self.precedence()?;
        for (i, source) in self.sources.iter().enumerate() {
            if precedence.rank(&source.name).is_none() {
                return Err(ConfigError::UnrankedSource(source.name.clone()));
            }
            if self.sources[..i].iter().any(|s| s.name == source.name) {
                return Err(ConfigError::DuplicateSource(source.name.clone()));
            }
        }
        if self.source(precedence.primary()).is_none() {
            return Err(ConfigError::MissingPrimary(precedence.primary().to_string()));
        }
        if self.indicators.period == 0 {
            return Err(ConfigError::ZeroPeriod);
        }
        let t = self.indicators.oversold_threshold;
        if !(0.0..=100.0).contains(&t) {
            return Err(ConfigError::ThresholdOutOfRange(t));
        }
        Ok(())
    }

    pub fn precedence(&self) -> Result<Precedence, ConfigError> {
        Ok(Precedence::new(self.precedence.iter().cloned())?)
    }

    pub fn source(&self, name: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.name == name)
    }

    /// Point a configured source at a different file.
    ///
    /// Returns `false` if no source has that name.
    pub fn override_path(&mut self, name: &str, path: PathBuf) -> bool {
        match self.sources.iter_mut().find(|s| s.name == name) {
            Some(source) => {
                source.path = path;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = PipelineConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.precedence, ["primary", "sentiment", "regional"]);
        assert_eq!(cfg.indicators.period, 14);
        assert_eq!(cfg.indicators.oversold_threshold, 32.0);
        assert_eq!(cfg.indicators.history_days, 21);
        assert_eq!(cfg.output.shape, OutputShape::Mapping);
    }

    #[test]
    fn toml_roundtrip() {
        let cfg = PipelineConfig::default();
        let text = cfg.to_toml().unwrap();
        let parsed = PipelineConfig::from_toml(&text).unwrap();
        assert_eq!(cfg, parsed);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let cfg = PipelineConfig::from_toml(
            r#"
            precedence = ["screener"]

            [[sources]]
            name = "screener"
            kind = "primary"
            path = "in.json"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.sources[0].reserved_keys, ["_date"]);
        assert!(cfg.sources[0].container_keys.is_empty());
        assert_eq!(cfg.output.path, PathBuf::from("combined_output.json"));
        assert_eq!(cfg.filters.min_market_cap, None);
    }

    #[test]
    fn alias_overrides_and_identity_keys() {
        let cfg = PipelineConfig::from_toml(
            r#"
            precedence = ["primary"]

            [[sources]]
            name = "primary"
            kind = "primary"
            path = "in.json"
            identity_keys = ["code"]

            [sources.aliases]
            price = ["last", "close"]
            "#,
        )
        .unwrap();
        let table = cfg.sources[0].alias_table();
        assert_eq!(table.identity_keys, ["code"]);
        assert_eq!(table.aliases(Field::Price), ["last", "close"]);
        assert_eq!(table.aliases(Field::Rsi)[0], "rsi");
    }

    #[test]
    fn rejects_unranked_and_duplicate_sources() {
        let mut cfg = PipelineConfig::default();
        cfg.sources.push(SourceConfig::new("options", SourceKind::Sentiment, "o.json", &[]));
        assert!(matches!(cfg.validate(), Err(ConfigError::UnrankedSource(n)) if n == "options"));

        let mut cfg = PipelineConfig::default();
        let dup = cfg.sources[1].clone();
        cfg.sources.push(dup);
        assert!(matches!(cfg.validate(), Err(ConfigError::DuplicateSource(_))));
    }

    #[test]
    fn rejects_bad_precedence_and_missing_primary() {
        let mut cfg = PipelineConfig::default();
        cfg.precedence.clear();
        assert!(matches!(cfg.validate(), Err(ConfigError::Precedence(_))));

        let mut cfg = PipelineConfig::default();
        cfg.sources.remove(0);
        assert!(matches!(cfg.validate(), Err(ConfigError::MissingPrimary(_))));
    }

    #[test]
    fn rejects_bad_indicator_policy() {
        let mut cfg = PipelineConfig::default();
        cfg.indicators.period = 0;
        assert!(matches!(cfg.validate(), Err(ConfigError::ZeroPeriod)));

        let mut cfg = PipelineConfig::default();
        cfg.indicators.oversold_threshold = 120.0;
        assert!(matches!(cfg.validate(), Err(ConfigError::ThresholdOutOfRange(_))));
    }

    #[test]
    fn file_provider_needs_prices_for_snapshots_only() {
        let mut cfg = PipelineConfig::default();
        cfg.snapshot.provider = ProviderKind::File;
        cfg.validate().unwrap();
        assert!(matches!(
            cfg.snapshot.validate(),
            Err(ConfigError::MissingPricesPath)
        ));
        cfg.snapshot.prices = Some(PathBuf::from("closes.json"));
        cfg.snapshot.validate().unwrap();
    }

    #[test]
    fn merge_config_loads_with_incomplete_snapshot_section() {
        let cfg = PipelineConfig::from_toml(
            r#"
            precedence = ["primary"]

            [[sources]]
            name = "primary"
            kind = "primary"
            path = "in.json"

            [snapshot]
            provider = "file"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.snapshot.provider, ProviderKind::File);
        assert!(cfg.snapshot.validate().is_err());
    }

    #[test]
    fn path_overrides() {
        let mut cfg = PipelineConfig::default();
        assert!(cfg.override_path("sentiment", PathBuf::from("s.json")));
        assert_eq!(cfg.source("sentiment").unwrap().path, PathBuf::from("s.json"));
        assert!(!cfg.override_path("missing", PathBuf::from("x.json")));
    }

    #[test]
    fn thread_count_is_bounded() {
        let mut snap = SnapshotConfig::default();
        let n = snap.thread_count();
        assert!((1..=MAX_DEFAULT_THREADS).contains(&n));
        snap.threads = Some(3);
        assert_eq!(snap.thread_count(), 3);
    }
}
