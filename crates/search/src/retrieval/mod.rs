//! Retrieval refinement
//!
//! Turns raw backend hits into question documents and layers three query
//! modes on top:
//! - Free text (backend results as-is)
//! - Exact concept (over-fetch, filter on tags, fall back to unfiltered)
//! - Exact id (scan a small candidate window)

use question_rag_common::{
    codec::decode_fragment,
    errors::{AppError, Result},
    metrics::{self, QueryMetrics},
    Document, SearchBackend,
};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Over-fetch multiplier for concept search
pub const CONCEPT_OVERFETCH: usize = 3;

/// Candidate window scanned by id lookup
pub const ID_LOOKUP_WINDOW: usize = 10;

/// Query modes over one search backend
pub struct QuestionRetriever {
    backend: Arc<dyn SearchBackend>,
}

impl QuestionRetriever {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Query the backend and decode every fragment, keeping backend order
    async fn raw_query(&self, text: &str, limit: usize) -> Result<Vec<Document>> {
        let fragments = self.backend.query(text, limit).await.map_err(|e| {
            metrics::record_backend_error(self.backend.name());
            match e {
                AppError::RetrievalBackend { .. } => e,
                other => AppError::backend(other.to_string()),
            }
        })?;

        Ok(fragments
            .into_iter()
            .map(|fragment| decode_fragment(&fragment.text).with_score(fragment.score))
            .collect())
    }

    /// Free-text search: backend results, unmodified
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<Document>> {
        let tracker = QueryMetrics::start("search");
        let docs = self.raw_query(query, top_k).await?;
        tracker.finish(docs.len());
        Ok(docs)
    }

    /// Questions tagged with `concept`, in backend order.
    ///
    /// Fetches `top_k * 3` candidates and keeps those whose main or related
    /// concepts equal `concept` (case-insensitive). If none survive, the
    /// unfiltered candidates are returned instead, truncated to `top_k`.
    #[instrument(skip(self))]
    pub async fn search_by_concept(&self, concept: &str, top_k: usize) -> Result<Vec<Document>> {
        let tracker = QueryMetrics::start("concept");
        let candidates = self
            .raw_query(concept, top_k.saturating_mul(CONCEPT_OVERFETCH))
            .await?;

        let mut tagged: Vec<Document> = candidates
            .iter()
            .filter(|doc| doc.is_tagged_with(concept))
            .cloned()
            .collect();

        let docs = if tagged.is_empty() {
            debug!(candidates = candidates.len(), "No tagged candidates, returning unfiltered");
            metrics::record_concept_fallback();
            candidates.into_iter().take(top_k).collect()
        } else {
            tagged.truncate(top_k);
            tagged
        };

        tracker.finish(docs.len());
        Ok(docs)
    }

    /// Look up one question by id.
    ///
    /// Best effort: the id is sent as a free-text query and only the top
    /// `ID_LOOKUP_WINDOW` hits are scanned, so a stored question the backend
    /// ranks lower is reported as absent.
    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Document>> {
        let tracker = QueryMetrics::start("id");
        let candidates = self.raw_query(id, ID_LOOKUP_WINDOW).await?;

        let found = candidates.into_iter().find(|doc| doc.has_id(id));
        if found.is_none() {
            metrics::record_id_miss();
        }

        tracker.finish(usize::from(found.is_some()));
        Ok(found)
    }
}
