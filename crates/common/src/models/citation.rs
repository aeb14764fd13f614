//! Citation edges

use serde::{Deserialize, Serialize};

/// A directed citation: `citing_id` cites `cited_id`.
///
/// Stored on disk as a two-element array `["citing", "cited"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct Citation {
    pub citing_id: String,
    pub cited_id: String,
}

impl Citation {
    pub fn new(citing_id: impl Into<String>, cited_id: impl Into<String>) -> Self {
        Self {
            citing_id: citing_id.into(),
            cited_id: cited_id.into(),
        }
    }

    /// Whether the paper is either end of this edge
    pub fn touches(&self, paper_id: &str) -> bool {
        self.citing_id == paper_id || self.cited_id == paper_id
    }
}

impl From<(String, String)> for Citation {
    fn from((citing_id, cited_id): (String, String)) -> Self {
        Self { citing_id, cited_id }
    }
}

impl From<Citation> for (String, String) {
    fn from(c: Citation) -> Self {
        (c.citing_id, c.cited_id)
    }
}

/// Request body for adding a citation
#[derive(Debug, Clone, Deserialize)]
pub struct CitationInput {
    pub citing_id: String,
    pub cited_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_encoding() {
        let c = Citation::new("0002", "0001");
        assert_eq!(serde_json::to_string(&c).unwrap(), r#"["0002","0001"]"#);

        let parsed: Citation = serde_json::from_str(r#"["a","b"]"#).unwrap();
        assert_eq!(parsed, Citation::new("a", "b"));
    }

    #[test]
    fn test_touches() {
        let c = Citation::new("a", "b");
        assert!(c.touches("a"));
        assert!(c.touches("b"));
        assert!(!c.touches("c"));
    }
}
