//! Ingestion error types

use question_rag_common::errors::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("Input not found: {path}")]
    MissingInput { path: String },

    #[error("Malformed input {path}: expected {expected} ({reason})")]
    MalformedInput {
        path: String,
        expected: &'static str,
        reason: String,
    },

    #[error("Staging error: {0}")]
    Storage(String),

    #[error("Import error: {0}")]
    Import(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<AppError> for IngestionError {
    fn from(e: AppError) -> Self {
        match e {
            AppError::Storage { message } => IngestionError::Storage(message),
            AppError::Import { message } => IngestionError::Import(message),
            AppError::Configuration { message } => IngestionError::Configuration(message),
            other => IngestionError::Upstream(other.to_string()),
        }
    }
}
