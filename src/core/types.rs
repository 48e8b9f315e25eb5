use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Identifier of a Cluster of Orthologous Groups (e.g. `COG0001`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CogId(pub String);

impl CogId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Single-letter COG functional category code.
///
/// The known set is the 25 uppercase letters `A..=Z` without `X`; a
/// `CategoryCode` can only be constructed for one of those letters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CategoryCode(char);

impl CategoryCode {
    /// Returns `None` for anything outside the fixed 25-code set
    #[must_use]
    pub fn new(c: char) -> Option<Self> {
        if c.is_ascii_uppercase() && c != 'X' {
            Some(Self(c))
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_char(self) -> char {
        self.0
    }

    /// Iterate all known codes in alphabetical order
    pub fn all() -> impl Iterator<Item = Self> {
        ('A'..='Z').filter_map(Self::new)
    }

    /// Parse a run of category letters such as `"KT"`.
    ///
    /// Returns the first offending character on failure.
    pub fn parse_run(s: &str) -> Result<Vec<Self>, char> {
        let mut codes = Vec::with_capacity(s.len());
        for c in s.chars().filter(|c| !c.is_whitespace()) {
            let code = Self::new(c).ok_or(c)?;
            if !codes.contains(&code) {
                codes.push(code);
            }
        }
        Ok(codes)
    }
}

impl std::fmt::Display for CategoryCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for CategoryCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_char(self.0)
    }
}

impl<'de> Deserialize<'de> for CategoryCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let c = char::deserialize(deserializer)?;
        Self::new(c).ok_or_else(|| {
            serde::de::Error::custom(format!("unknown COG category code '{c}'"))
        })
    }
}

/// Outcome of classifying one query sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClassificationStatus {
    /// A single best hit was selected
    Classified,
    /// No hit survived filtering and catalog resolution
    NoHit,
    /// The top two hits are within the configured bit-score tolerance
    Ambiguous,
}

impl std::fmt::Display for ClassificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Classified => write!(f, "CLASSIFIED"),
            Self::NoHit => write!(f, "NO_HIT"),
            Self::Ambiguous => write!(f, "AMBIGUOUS"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_code_rejects_x_and_lowercase() {
        assert!(CategoryCode::new('J').is_some());
        assert!(CategoryCode::new('X').is_none());
        assert!(CategoryCode::new('j').is_none());
        assert!(CategoryCode::new('1').is_none());
        assert_eq!(CategoryCode::all().count(), 25);
    }

    #[test]
    fn test_parse_run_keeps_order_and_dedups() {
        let codes = CategoryCode::parse_run("KTK").unwrap();
        let chars: Vec<char> = codes.iter().map(|c| c.as_char()).collect();
        assert_eq!(chars, vec!['K', 'T']);

        assert_eq!(CategoryCode::parse_run("KX"), Err('X'));
    }

    #[test]
    fn test_status_serializes_screaming_case() {
        let json = serde_json::to_string(&ClassificationStatus::NoHit).unwrap();
        assert_eq!(json, "\"NO_HIT\"");
        let back: ClassificationStatus = serde_json::from_str("\"AMBIGUOUS\"").unwrap();
        assert_eq!(back, ClassificationStatus::Ambiguous);
    }
}
