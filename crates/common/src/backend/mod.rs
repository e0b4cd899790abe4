//! Search backend abstraction
//!
//! The semantic search engine is an external collaborator. This module pins
//! down the two capabilities the system needs from it:
//! - `SearchBackend`: ranked text fragments for a free-text query
//! - `CorpusImporter`: (re)import of a staged corpus file, fire-and-forget
//!
//! Implementations:
//! - `VertexRagBackend` (managed RAG corpus over HTTP)
//! - `LocalCorpusBackend` (in-process BM25 over the staged corpus file)

mod local;
mod vertex;

pub use local::{LocalCorpusBackend, FILE_SCHEME};
pub use vertex::VertexRagBackend;

use crate::config::{AppConfig, BackendProvider};
use crate::errors::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One ranked fragment returned by a backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredFragment {
    /// Raw fragment text, ideally one tagged block
    pub text: String,

    /// Backend-specific similarity score
    pub score: f64,
}

impl ScoredFragment {
    pub fn new(text: impl Into<String>, score: f64) -> Self {
        Self {
            text: text.into(),
            score,
        }
    }
}

/// Trait for similarity search over the indexed corpus
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Return up to `top_k` fragments in the backend's relevance order
    async fn query(&self, text: &str, top_k: usize) -> Result<Vec<ScoredFragment>>;

    /// Get the backend name
    fn name(&self) -> &str;
}

/// Trait for handing staged corpus files to the backend's indexer
#[async_trait]
pub trait CorpusImporter: Send + Sync {
    /// Request an import of `locations` into `corpus`.
    ///
    /// Returns once the request is accepted; completion is not observed.
    async fn import(&self, corpus: &str, locations: &[String]) -> Result<()>;
}

/// Create the configured search backend.
///
/// The local backend is loaded from the staged corpus file in
/// `storage.local_dir`.
pub async fn create_backend(config: &AppConfig) -> Result<Arc<dyn SearchBackend>> {
    match config.backend.provider {
        BackendProvider::Vertex => Ok(Arc::new(VertexRagBackend::from_config(config)?)),
        BackendProvider::Local => {
            let path = config.storage.local_dir.join(&config.corpus.corpus_file);
            Ok(Arc::new(LocalCorpusBackend::load(&path).await?))
        }
    }
}

/// Create the configured corpus importer
pub fn create_importer(config: &AppConfig) -> Result<Arc<dyn CorpusImporter>> {
    match config.backend.provider {
        BackendProvider::Vertex => Ok(Arc::new(VertexRagBackend::from_config(config)?)),
        BackendProvider::Local => Ok(Arc::new(LocalCorpusBackend::empty())),
    }
}

/// Name passed to `CorpusImporter::import` for the configured provider
pub fn corpus_handle(config: &AppConfig) -> Result<String> {
    match config.backend.provider {
        BackendProvider::Vertex => config.corpus_resource_name(),
        BackendProvider::Local => Ok(config
            .corpus
            .corpus_name
            .clone()
            .unwrap_or_else(|| "local".to_string())),
    }
}
