//! Managed RAG corpus client
//!
//! Talks to the Vertex AI RAG REST API:
//! - `POST /v1/projects/{p}/locations/{l}:retrieveContexts` for queries
//! - `POST /v1/{corpus}/ragFiles:import` for corpus re-imports

use super::{CorpusImporter, ScoredFragment, SearchBackend};
use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// HTTP client for a managed RAG corpus
pub struct VertexRagBackend {
    client: reqwest::Client,
    base_url: String,
    corpus: String,
    access_token: Option<String>,
}

#[derive(Serialize)]
struct RetrieveContextsRequest<'a> {
    vertex_rag_store: RagStore<'a>,
    query: RagQuery<'a>,
}

#[derive(Serialize)]
struct RagStore<'a> {
    rag_resources: Vec<RagResource<'a>>,
}

#[derive(Serialize)]
struct RagResource<'a> {
    rag_corpus: &'a str,
}

#[derive(Serialize)]
struct RagQuery<'a> {
    text: &'a str,
    rag_retrieval_config: RetrievalConfig,
}

#[derive(Serialize)]
struct RetrievalConfig {
    top_k: usize,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RetrieveContextsResponse {
    contexts: ContextList,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ContextList {
    contexts: Vec<RagContext>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RagContext {
    text: String,
    score: f64,
}

#[derive(Serialize)]
struct ImportRagFilesRequest<'a> {
    import_rag_files_config: ImportConfig<'a>,
}

#[derive(Serialize)]
struct ImportConfig<'a> {
    gcs_source: GcsSource<'a>,
}

#[derive(Serialize)]
struct GcsSource<'a> {
    uris: &'a [String],
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct Operation {
    name: String,
}

impl VertexRagBackend {
    /// Create a new client for `corpus` (full resource name)
    pub fn new(
        base_url: impl Into<String>,
        corpus: impl Into<String>,
        access_token: Option<String>,
        timeout: std::time::Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            corpus: corpus.into(),
            access_token,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            config.backend_api_base()?,
            config.corpus_resource_name()?,
            config.backend.access_token.clone(),
            config.backend_timeout(),
        )
    }

    /// `projects/{p}/locations/{l}` prefix of the corpus resource name
    fn parent(&self) -> &str {
        match self.corpus.find("/ragCorpora/") {
            Some(idx) => &self.corpus[..idx],
            None => &self.corpus,
        }
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl SearchBackend for VertexRagBackend {
    async fn query(&self, text: &str, top_k: usize) -> Result<Vec<ScoredFragment>> {
        let url = format!("{}/v1/{}:retrieveContexts", self.base_url, self.parent());

        let request = RetrieveContextsRequest {
            vertex_rag_store: RagStore {
                rag_resources: vec![RagResource {
                    rag_corpus: &self.corpus,
                }],
            },
            query: RagQuery {
                text,
                rag_retrieval_config: RetrievalConfig { top_k },
            },
        };

        let response = self
            .authorized(self.client.post(&url))
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::backend(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::backend(format!("API error {}: {}", status, body)));
        }

        let result: RetrieveContextsResponse = response
            .json()
            .await
            .map_err(|e| AppError::backend(format!("Failed to parse response: {}", e)))?;

        let fragments: Vec<ScoredFragment> = result
            .contexts
            .contexts
            .into_iter()
            .map(|ctx| ScoredFragment::new(ctx.text, ctx.score))
            .collect();

        debug!(top_k, returned = fragments.len(), "Contexts retrieved");
        Ok(fragments)
    }

    fn name(&self) -> &str {
        "vertex"
    }
}

#[async_trait]
impl CorpusImporter for VertexRagBackend {
    async fn import(&self, corpus: &str, locations: &[String]) -> Result<()> {
        let url = format!("{}/v1/{}/ragFiles:import", self.base_url, corpus);

        let request = ImportRagFilesRequest {
            import_rag_files_config: ImportConfig {
                gcs_source: GcsSource { uris: locations },
            },
        };

        let response = self
            .authorized(self.client.post(&url))
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Import {
                message: format!("Request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Import {
                message: format!("API error {}: {}", status, body),
            });
        }

        // Long-running operation; accepted is all we report
        let operation: Operation = response.json().await.unwrap_or_default();
        info!(
            corpus,
            files = locations.len(),
            operation = %operation.name,
            "Corpus import requested"
        );
        Ok(())
    }
}
