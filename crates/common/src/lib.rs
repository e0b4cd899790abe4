//! Question RAG Common Library
//!
//! Shared code for the ingestion and search services including:
//! - The question document model
//! - The tagged-block corpus codec
//! - Search backend and object storage abstractions
//! - Error types and handling
//! - Configuration management
//! - Metrics and tracing setup

pub mod backend;
pub mod codec;
pub mod config;
pub mod document;
pub mod errors;
pub mod metrics;
pub mod storage;
pub mod telemetry;

// Re-export commonly used types
pub use backend::{CorpusImporter, ScoredFragment, SearchBackend};
pub use config::AppConfig;
pub use document::Document;
pub use errors::{AppError, Result};
pub use storage::ObjectStore;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Main concept recorded when the upstream matcher produced no match
pub const UNKNOWN_CONCEPT: &str = "UNKNOWN";

/// Id recorded when a fragment carries no readable `[ID: ...]` header
pub const UNKNOWN_ID: &str = "UNKNOWN_ID";

/// Maximum number of related concepts kept per question
pub const MAX_CONCEPTS: usize = 3;
