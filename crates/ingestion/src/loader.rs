//! Matcher dataset loading
//!
//! Reads the upstream concept matcher output:
//! `{ "questions": [ { "question": str, "matches": [ { "concept": str, "score": float } ] } ] }`

use crate::errors::IngestionError;
use serde::Deserialize;
use std::path::Path;
use tracing::{info, instrument};

/// Shape reported in `MalformedInput` errors
pub const EXPECTED_SHAPE: &str =
    "an object with a `questions` array of {question, matches[{concept, score}]} objects";

/// One concept match as produced by the matcher
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMatch {
    #[serde(default)]
    pub concept: Option<String>,

    #[serde(default)]
    pub score: Option<f64>,
}

/// One question with its ranked matches
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawQuestion {
    #[serde(default)]
    pub question: Option<String>,

    #[serde(default)]
    pub matches: Option<Vec<RawMatch>>,
}

impl RawQuestion {
    pub fn text(&self) -> &str {
        self.question.as_deref().unwrap_or_default()
    }

    pub fn matches(&self) -> &[RawMatch] {
        self.matches.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct MatcherDataset {
    questions: Vec<RawQuestion>,
}

/// Parse a matcher dataset already read into memory
pub fn parse_questions(raw: &str, path: &Path) -> Result<Vec<RawQuestion>, IngestionError> {
    let dataset: MatcherDataset =
        serde_json::from_str(raw).map_err(|e| IngestionError::MalformedInput {
            path: path.display().to_string(),
            expected: EXPECTED_SHAPE,
            reason: e.to_string(),
        })?;
    Ok(dataset.questions)
}

/// Load the matcher dataset from `path`
#[instrument(fields(path = %path.display()))]
pub async fn load_questions(path: &Path) -> Result<Vec<RawQuestion>, IngestionError> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(IngestionError::MissingInput {
                path: path.display().to_string(),
            });
        }
        Err(e) => return Err(e.into()),
    };

    let questions = parse_questions(&raw, path)?;
    info!(questions = questions.len(), "Matcher dataset loaded");
    Ok(questions)
}
