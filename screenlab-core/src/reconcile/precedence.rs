use super::engine::MergeError;
use serde::{Deserialize, Serialize};

/// Ordered source names, highest trust first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Precedence(Vec<String>);

impl Precedence {
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Result<Self, MergeError> {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(MergeError::EmptyPrecedence);
        }
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(MergeError::DuplicateSource(name.clone()));
            }
        }
        Ok(Self(names))
    }

    /// The documented default: primary screener, sentiment, regional snapshot.
    pub fn standard() -> Self {
        Self(vec!["primary".into(), "sentiment".into(), "regional".into()])
    }

    /// The mandatory source.
    pub fn primary(&self) -> &str {
        &self.0[0]
    }

    pub fn rank(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|n| n == name)
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }
}

impl TryFrom<Vec<String>> for Precedence {
    type Error = MergeError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(names)
    }
}

impl From<Precedence> for Vec<String> {
    fn from(p: Precedence) -> Self {
        p.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_order() {
        let p = Precedence::standard();
        assert_eq!(p.primary(), "primary");
        assert_eq!(p.rank("sentiment"), Some(1));
        assert_eq!(p.rank("regional"), Some(2));
        assert_eq!(p.rank("other"), None);
    }

    #[test]
    fn rejects_empty_and_duplicates() {
        assert!(matches!(
            Precedence::new(Vec::<String>::new()),
            Err(MergeError::EmptyPrecedence)
        ));
        assert!(matches!(
            Precedence::new(["a", "b", "a"]),
            Err(MergeError::DuplicateSource(name)) if name == "a"
        ));
    }

    #[test]
    fn deserialization_validates() {
        let ok: Precedence = serde_json::from_str(r#"["x", "y"]"#).unwrap();
        assert_eq!(ok.primary(), "x");
        assert!(serde_json::from_str::<Precedence>(r#"["x", "x"]"#).is_err());
    }
}
