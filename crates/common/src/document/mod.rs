//! Question document model
//!
//! One exam question with its topic tags. Documents are created in bulk by
//! ingestion and are never mutated afterwards; query results carry the
//! backend's similarity score.

use serde::{Deserialize, Serialize};

/// A single question record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Stable external id (`q_001`, `q_002`, ...)
    pub id: String,

    /// Question body
    pub text: String,

    /// Best-matching topic, or `UNKNOWN`
    pub main_concept: String,

    /// Related topics in matcher relevance order (at most 3)
    pub concepts: Vec<String>,

    /// Backend similarity score; 0.0 for freshly ingested documents
    #[serde(default)]
    pub score: f64,
}

impl Document {
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        main_concept: impl Into<String>,
        concepts: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            main_concept: main_concept.into(),
            concepts,
            score: 0.0,
        }
    }

    /// Attach a query score
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = score;
        self
    }

    /// True when `concept` names the main concept or one of the related ones.
    /// Comparison is case-insensitive and ignores surrounding whitespace.
    pub fn is_tagged_with(&self, concept: &str) -> bool {
        let target = concept.trim().to_lowercase();
        self.main_concept.to_lowercase() == target
            || self.concepts.iter().any(|c| c.to_lowercase() == target)
    }

    /// True when this document's id equals `id`, ignoring case and whitespace
    pub fn has_id(&self, id: &str) -> bool {
        self.id.trim().to_lowercase() == id.trim().to_lowercase()
    }
}

/// Shape of one entry in the normalized metadata artifact.
///
/// Scores are query-time data and are not persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub id: String,
    pub text: String,
    pub main_concept: String,
    #[serde(default)]
    pub concepts: Vec<String>,
}

impl From<&Document> for NormalizedRecord {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            text: doc.text.clone(),
            main_concept: doc.main_concept.clone(),
            concepts: doc.concepts.clone(),
        }
    }
}

impl From<NormalizedRecord> for Document {
    fn from(record: NormalizedRecord) -> Self {
        Document::new(record.id, record.text, record.main_concept, record.concepts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        Document::new(
            "q_007",
            "Explain strategic risk.",
            "Strategic Risk",
            vec!["Strategic Risk".into(), "SSBR".into()],
        )
    }

    #[test]
    fn test_default_score_is_neutral() {
        assert_eq!(sample().score, 0.0);
        assert_eq!(sample().with_score(0.42).score, 0.42);
    }

    #[test]
    fn test_value_equality() {
        assert_eq!(sample(), sample());
        assert_ne!(sample(), sample().with_score(0.1));
    }

    #[test]
    fn test_concept_tag_matching() {
        let doc = sample();
        assert!(doc.is_tagged_with("  strategic risk "));
        assert!(doc.is_tagged_with("ssbr"));
        assert!(!doc.is_tagged_with("liquidity"));
    }

    #[test]
    fn test_id_matching_ignores_case() {
        let doc = sample();
        assert!(doc.has_id("Q_007"));
        assert!(doc.has_id(" q_007 "));
        assert!(!doc.has_id("q_070"));
    }

    #[test]
    fn test_normalized_record_omits_score() {
        let record = NormalizedRecord::from(&sample().with_score(0.9));
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("score").is_none());
        assert_eq!(json["id"], "q_007");

        let back: Document = record.into();
        assert_eq!(back, sample());
    }
}
