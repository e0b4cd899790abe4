//! Matcher output to question documents

use crate::loader::{RawMatch, RawQuestion};
use question_rag_common::{Document, MAX_CONCEPTS, UNKNOWN_CONCEPT};
use tracing::{debug, warn};

/// External id for the `seq`-th question (1-based)
pub fn question_id(seq: usize) -> String {
    format!("q_{:03}", seq)
}

/// Normalize every question, preserving input order
pub fn normalize(questions: &[RawQuestion]) -> Vec<Document> {
    let documents: Vec<Document> = questions
        .iter()
        .enumerate()
        .map(|(idx, question)| normalize_one(idx + 1, question))
        .collect();

    debug!(documents = documents.len(), "Questions normalized");
    documents
}

fn normalize_one(seq: usize, question: &RawQuestion) -> Document {
    let id = question_id(seq);
    let matches = question.matches();

    if !scores_descending(matches) {
        warn!(id = %id, "Matches are not ordered by descending score; using them as given");
    }

    // First match is taken as the best one, no re-sorting
    let main_concept = matches
        .first()
        .and_then(|m| m.concept.as_deref())
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(UNKNOWN_CONCEPT);

    let concepts: Vec<String> = matches
        .iter()
        .take(MAX_CONCEPTS)
        .filter_map(|m| m.concept.as_deref())
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();

    Document::new(id, question.text().trim(), main_concept, concepts)
}

/// Matches without a score are ignored by the check
fn scores_descending(matches: &[RawMatch]) -> bool {
    let scores: Vec<f64> = matches.iter().filter_map(|m| m.score).collect();
    scores.windows(2).all(|pair| pair[0] >= pair[1])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matched(concept: &str, score: f64) -> RawMatch {
        RawMatch {
            concept: Some(concept.to_string()),
            score: Some(score),
        }
    }

    fn question(text: &str, matches: Vec<RawMatch>) -> RawQuestion {
        RawQuestion {
            question: Some(text.to_string()),
            matches: Some(matches),
        }
    }

    #[test]
    fn test_ids_are_sequential_and_padded() {
        let questions: Vec<RawQuestion> = (0..12).map(|i| question(&format!("Q{i}"), vec![])).collect();
        let docs = normalize(&questions);

        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids.first(), Some(&"q_001"));
        assert_eq!(ids.last(), Some(&"q_012"));
        assert_eq!(ids.len(), 12);
        assert_eq!(docs[4].text, "Q4");
    }

    #[test]
    fn test_wide_sequence_ids() {
        assert_eq!(question_id(7), "q_007");
        assert_eq!(question_id(1234), "q_1234");
    }

    #[test]
    fn test_no_matches_is_unknown() {
        let docs = normalize(&[RawQuestion {
            question: Some("  Orphan question  ".into()),
            matches: None,
        }]);

        assert_eq!(docs[0].main_concept, UNKNOWN_CONCEPT);
        assert!(docs[0].concepts.is_empty());
        assert_eq!(docs[0].text, "Orphan question");
        assert_eq!(docs[0].score, 0.0);
    }

    #[test]
    fn test_keeps_first_three_concepts_in_order() {
        let docs = normalize(&[question(
            "Q",
            vec![
                matched("Strategic Risk", 0.9),
                matched("Governance", 0.8),
                matched("Liquidity", 0.7),
                matched("Capital", 0.6),
                matched("Conduct", 0.5),
            ],
        )]);

        assert_eq!(docs[0].main_concept, "Strategic Risk");
        assert_eq!(
            docs[0].concepts,
            vec!["Strategic Risk", "Governance", "Liquidity"]
        );
    }

    #[test]
    fn test_empty_concept_names_are_skipped() {
        let docs = normalize(&[question(
            "Q",
            vec![matched("Risk", 0.9), matched("  ", 0.8), matched("Capital", 0.7), matched("Conduct", 0.6)],
        )]);

        // Only the first three matches are considered, blanks dropped
        assert_eq!(docs[0].concepts, vec!["Risk", "Capital"]);
    }

    #[test]
    fn test_blank_first_concept_is_unknown() {
        let docs = normalize(&[question("Q", vec![matched(" ", 0.9), matched("Risk", 0.8)])]);
        assert_eq!(docs[0].main_concept, UNKNOWN_CONCEPT);
        assert_eq!(docs[0].concepts, vec!["Risk"]);
    }

    #[test]
    fn test_unordered_matches_are_not_resorted() {
        let docs = normalize(&[question(
            "Q",
            vec![matched("Low", 0.2), matched("High", 0.9)],
        )]);
        assert_eq!(docs[0].main_concept, "Low");
        assert_eq!(docs[0].concepts, vec!["Low", "High"]);
    }

    #[test]
    fn test_scores_descending() {
        assert!(scores_descending(&[]));
        assert!(scores_descending(&[matched("a", 0.9), matched("b", 0.9), matched("c", 0.1)]));
        assert!(!scores_descending(&[matched("a", 0.1), matched("b", 0.9)]));
    }
}
