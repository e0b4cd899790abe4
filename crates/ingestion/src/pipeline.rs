//! Ingestion pipeline
//!
//! Five stages, strictly in order, each failing fast:
//! 1. Load the matcher dataset
//! 2. Normalize it into question documents
//! 3. Persist the normalized artifact
//! 4. Render the corpus blob (also written locally)
//! 5. Stage the blob in object storage and request a backend import
//!
//! `resume_from` restarts the run at stage 4 (from the normalized artifact)
//! or stage 5 (from the local corpus file).

use crate::errors::IngestionError;
use crate::loader::load_questions;
use crate::normalizer::normalize;
use chrono::{DateTime, Utc};
use question_rag_common::{
    backend::corpus_handle,
    codec::{render_corpus, split_corpus},
    config::{AppConfig, IngestionConfig, ResumeFrom},
    document::NormalizedRecord,
    metrics, CorpusImporter, Document, ObjectStore,
};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

/// Summary of one ingestion run
#[derive(Debug, Clone, Serialize)]
pub struct IngestionReport {
    pub resumed_from: ResumeFrom,
    pub documents: usize,
    pub normalized_path: Option<PathBuf>,
    pub corpus_path: PathBuf,
    pub corpus_bytes: usize,
    /// Hex SHA-256 of the corpus blob
    pub checksum: String,
    pub location: String,
    pub corpus: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

/// Ingestion pipeline over injected storage and indexing collaborators
pub struct IngestionPipeline {
    settings: IngestionConfig,
    object_key: String,
    corpus: String,
    store: Arc<dyn ObjectStore>,
    importer: Arc<dyn CorpusImporter>,
}

impl IngestionPipeline {
    pub fn new(
        config: &AppConfig,
        store: Arc<dyn ObjectStore>,
        importer: Arc<dyn CorpusImporter>,
    ) -> Result<Self, IngestionError> {
        Ok(Self {
            settings: config.ingestion.clone(),
            object_key: config.corpus.corpus_file.clone(),
            corpus: corpus_handle(config)?,
            store,
            importer,
        })
    }

    /// Run the pipeline from the configured stage
    #[instrument(skip(self), fields(resume_from = ?self.settings.resume_from))]
    pub async fn run(&self) -> Result<IngestionReport, IngestionError> {
        let started_at = Utc::now();
        let timer = Instant::now();

        let (documents, normalized_path, blob) = match self.settings.resume_from {
            ResumeFrom::Load => {
                let questions = load_questions(&self.settings.input_path).await?;
                let docs = normalize(&questions);
                self.persist_normalized(&docs).await?;
                let blob = self.render(&docs).await?;
                (docs.len(), Some(self.settings.normalized_path.clone()), blob)
            }
            ResumeFrom::Render => {
                let docs = self.load_normalized().await?;
                let blob = self.render(&docs).await?;
                (docs.len(), None, blob)
            }
            ResumeFrom::Stage => {
                let blob = read_artifact(&self.settings.corpus_path).await?;
                (split_corpus(&blob).len(), None, blob)
            }
        };

        let corpus_bytes = blob.len();
        let checksum = hex::encode(Sha256::digest(blob.as_bytes()));
        let location = self.stage(blob).await?;

        let elapsed = timer.elapsed();
        metrics::record_ingestion(elapsed.as_secs_f64(), documents);

        let report = IngestionReport {
            resumed_from: self.settings.resume_from,
            documents,
            normalized_path,
            corpus_path: self.settings.corpus_path.clone(),
            corpus_bytes,
            checksum,
            location,
            corpus: self.corpus.clone(),
            started_at,
            duration_ms: elapsed.as_millis() as u64,
        };

        info!(
            documents = report.documents,
            corpus_bytes = report.corpus_bytes,
            checksum = %report.checksum,
            location = %report.location,
            duration_ms = report.duration_ms,
            "Ingestion complete"
        );
        Ok(report)
    }

    /// Stage 3: write the normalized artifact as pretty JSON
    #[instrument(skip(self, docs), fields(path = %self.settings.normalized_path.display()))]
    async fn persist_normalized(&self, docs: &[Document]) -> Result<(), IngestionError> {
        let records: Vec<NormalizedRecord> = docs.iter().map(NormalizedRecord::from).collect();
        let json = serde_json::to_string_pretty(&records)?;
        write_artifact(&self.settings.normalized_path, json.as_bytes()).await?;

        info!(records = records.len(), "Normalized metadata saved");
        Ok(())
    }

    async fn load_normalized(&self) -> Result<Vec<Document>, IngestionError> {
        let path = &self.settings.normalized_path;
        let raw = read_artifact(path).await?;
        let records: Vec<NormalizedRecord> =
            serde_json::from_str(&raw).map_err(|e| IngestionError::MalformedInput {
                path: path.display().to_string(),
                expected: "a JSON array of {id, text, main_concept, concepts} records",
                reason: e.to_string(),
            })?;

        info!(records = records.len(), path = %path.display(), "Normalized metadata loaded");
        Ok(records.into_iter().map(Document::from).collect())
    }

    /// Stage 4: render the blob and keep a local copy
    #[instrument(skip(self, docs), fields(documents = docs.len()))]
    async fn render(&self, docs: &[Document]) -> Result<String, IngestionError> {
        let blob = render_corpus(docs);
        write_artifact(&self.settings.corpus_path, blob.as_bytes()).await?;

        info!(
            path = %self.settings.corpus_path.display(),
            bytes = blob.len(),
            "Corpus file written"
        );
        Ok(blob)
    }

    /// Stage 5: upload, then request the import without waiting on it
    #[instrument(skip(self, blob), fields(key = %self.object_key, corpus = %self.corpus))]
    async fn stage(&self, blob: String) -> Result<String, IngestionError> {
        let location = self.store.put(&self.object_key, blob.into_bytes()).await?;
        info!(location = %location, "Corpus staged");

        self.importer
            .import(&self.corpus, std::slice::from_ref(&location))
            .await?;
        Ok(location)
    }
}

async fn read_artifact(path: &Path) -> Result<String, IngestionError> {
    match tokio::fs::read_to_string(path).await {
        Ok(raw) => Ok(raw),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(IngestionError::MissingInput {
            path: path.display().to_string(),
        }),
        Err(e) => Err(e.into()),
    }
}

async fn write_artifact(path: &Path, contents: &[u8]) -> Result<(), IngestionError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, contents).await?;
    Ok(())
}
