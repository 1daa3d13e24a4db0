//! Snapshot universe: the instruments the regional producer covers.
//!
//! Stored as CSV with a header row `ticker,name,country,sector`. Extra
//! columns are ignored. Row order is kept.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UniverseError {
    #[error("cannot read universe {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed universe CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("universe row {row} has a blank ticker")]
    BlankTicker { row: usize },

    #[error("ticker {0:?} appears more than once in the universe")]
    DuplicateTicker(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniverseEntry {
    pub ticker: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub sector: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Universe {
    entries: Vec<UniverseEntry>,
}

impl Universe {
    pub fn from_file(path: &Path) -> Result<Self, UniverseError> {
        let file = std::fs::File::open(path).map_err(|source| UniverseError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, UniverseError> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut entries: Vec<UniverseEntry> = Vec::new();
        for (i, row) in rdr.deserialize().enumerate() {
            let entry: UniverseEntry = row?;
            if entry.ticker.is_empty() {
                return Err(UniverseError::BlankTicker { row: i + 1 });
            }
            if entries.iter().any(|e| e.ticker == entry.ticker) {
                return Err(UniverseError::DuplicateTicker(entry.ticker));
            }
            entries.push(entry);
        }
        Ok(Self { entries })
    }

    pub fn from_entries(entries: Vec<UniverseEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[UniverseEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.ticker.as_str())
    }
}

/// Tickers currently held; flags `inPortfolio` in the snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Portfolio(BTreeSet<String>);

impl Portfolio {
    pub fn contains(&self, ticker: &str) -> bool {
        self.0.contains(ticker)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Portfolio {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
ticker,name,country,sector
ASML.AS,ASML Holding,Netherlands,Technology
NOVO-B.CO, Novo Nordisk ,Denmark,Healthcare
ALV.DE,Allianz,Germany,Financials
";

    #[test]
    fn parses_rows_in_order() {
        let u = Universe::from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(u.len(), 3);
        let tickers: Vec<&str> = u.tickers().collect();
        assert_eq!(tickers, ["ASML.AS", "NOVO-B.CO", "ALV.DE"]);
        assert_eq!(u.entries()[1].name, "Novo Nordisk");
    }

    #[test]
    fn missing_metadata_columns_default_to_empty() {
        let u = Universe::from_reader("ticker\nEVO.ST\n".as_bytes()).unwrap();
        assert_eq!(u.entries()[0].country, "");
    }

    #[test]
    fn rejects_duplicates_and_blanks() {
        let dup = "ticker,name\nA,x\nA,y\n";
        assert!(matches!(
            Universe::from_reader(dup.as_bytes()),
            Err(UniverseError::DuplicateTicker(t)) if t == "A"
        ));
        let blank = "ticker,name\n,x\n";
        assert!(matches!(
            Universe::from_reader(blank.as_bytes()),
            Err(UniverseError::BlankTicker { row: 1 })
        ));
    }

    #[test]
    fn portfolio_membership() {
        let p: Portfolio = ["ASML.AS", "NKT.CO"].into_iter().collect();
        assert!(p.contains("ASML.AS"));
        assert!(!p.contains("ALV.DE"));
        assert_eq!(p.len(), 2);
    }
}
