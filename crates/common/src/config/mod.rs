//! Configuration management for Question RAG services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - The legacy RAG environment names (RAG_CORPUS_NAME, RAG_BUCKET_NAME, ...)
//! - Configuration files (config/default.toml, config/{APP_ENV}.toml)
//! - Default values
//!
//! The resulting `AppConfig` is immutable and is handed to the ingestion
//! pipeline and the retriever at construction time.

use crate::errors::{AppError, Result};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server configuration (search service)
    pub server: ServerConfig,

    /// RAG corpus identity
    pub corpus: CorpusConfig,

    /// Search backend configuration
    pub backend: BackendConfig,

    /// Object storage used to stage the corpus file
    pub storage: StorageConfig,

    /// Ingestion artifact locations
    pub ingestion: IngestionConfig,

    /// Retrieval defaults
    pub retrieval: RetrievalConfig,

    /// Observability configuration
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// Cloud project hosting the corpus
    pub project_id: Option<String>,

    /// Cloud region of the corpus
    pub location: Option<String>,

    /// Corpus id (last segment of the resource name)
    pub corpus_name: Option<String>,

    /// Object name of the staged corpus file
    pub corpus_file: String,
}

/// Which search backend implementation to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendProvider {
    /// Managed RAG corpus over HTTP
    #[default]
    Vertex,
    /// In-process lexical index over the staged corpus file
    Local,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    pub provider: BackendProvider,

    /// API base URL override (defaults to the regional endpoint)
    pub api_base: Option<String>,

    /// Pre-issued bearer token
    pub access_token: Option<String>,

    /// Client timeout in seconds
    pub timeout_secs: u64,
}

/// Which object store implementation to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageProvider {
    #[default]
    Gcs,
    Local,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub provider: StorageProvider,

    /// Bucket receiving the corpus file
    pub bucket: Option<String>,

    /// API base URL override
    pub api_base: Option<String>,

    /// Directory used by the local object store
    pub local_dir: PathBuf,
}

/// First ingestion stage to execute
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResumeFrom {
    /// Run every stage from the raw matcher dataset
    #[default]
    Load,
    /// Start from the persisted normalized artifact
    Render,
    /// Only stage and import the existing local corpus file
    Stage,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// Raw matcher dataset (`{"questions": [...]}`)
    pub input_path: PathBuf,

    /// Normalized metadata artifact
    pub normalized_path: PathBuf,

    /// Local copy of the rendered corpus blob
    pub corpus_path: PathBuf,

    pub resume_from: ResumeFrom,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// `top_k` used when a caller does not supply one
    pub default_top_k: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    pub log_level: String,

    /// Enable JSON logging
    pub json_logging: bool,

    /// Metrics port (0 to disable)
    pub metrics_port: u16,

    /// Service name for tracing
    pub service_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_secs: 30,
        }
    }
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            location: None,
            corpus_name: None,
            corpus_file: "metadata_tagging_file.txt".to_string(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            provider: BackendProvider::default(),
            api_base: None,
            access_token: None,
            timeout_secs: 30,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            provider: StorageProvider::default(),
            bucket: None,
            api_base: None,
            local_dir: PathBuf::from("data/staging"),
        }
    }
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("input/metadata_input.json"),
            normalized_path: PathBuf::from("input/normalized_metadata.json"),
            corpus_path: PathBuf::from("output/metadata_tagging_file.txt"),
            resume_from: ResumeFrom::default(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { default_top_k: 5 }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logging: true,
            metrics_port: 0,
            service_name: "question-rag".to_string(),
        }
    }
}

/// Legacy environment names mapped onto configuration keys
const LEGACY_ENV_KEYS: &[(&str, &str)] = &[
    ("GOOGLE_CLOUD_PROJECT", "corpus.project_id"),
    ("GOOGLE_CLOUD_LOCATION", "corpus.location"),
    ("RAG_CORPUS_NAME", "corpus.corpus_name"),
    ("RAG_CORPUS_FILE", "corpus.corpus_file"),
    ("RAG_BUCKET_NAME", "storage.bucket"),
];

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> std::result::Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let mut builder = Config::builder();

        // Legacy names sit below files and APP__ overrides
        for (var, key) in LEGACY_ENV_KEYS {
            if let Ok(value) = std::env::var(var) {
                builder = builder.set_default(*key, value)?;
            }
        }

        let config = builder
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables with APP__ prefix
            // e.g., APP__BACKEND__PROVIDER=local
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Check that the sections needed to reach the search backend are complete
    pub fn validate(&self) -> Result<()> {
        if self.retrieval.default_top_k == 0 {
            return Err(AppError::Configuration {
                message: "retrieval.default_top_k must be at least 1".to_string(),
            });
        }
        match (self.backend.provider, self.storage.provider) {
            (BackendProvider::Vertex, StorageProvider::Gcs) => {
                self.corpus_resource_name()?;
            }
            (BackendProvider::Local, StorageProvider::Local) => {}
            (backend, storage) => {
                return Err(AppError::Configuration {
                    message: format!(
                        "backend.provider {:?} cannot read a corpus staged by storage.provider {:?}",
                        backend, storage
                    ),
                });
            }
        }
        Ok(())
    }

    /// Full corpus resource name:
    /// `projects/{project}/locations/{location}/ragCorpora/{corpus}`
    pub fn corpus_resource_name(&self) -> Result<String> {
        Ok(format!(
            "projects/{}/locations/{}/ragCorpora/{}",
            required(&self.corpus.project_id, "corpus.project_id")?,
            required(&self.corpus.location, "corpus.location")?,
            required(&self.corpus.corpus_name, "corpus.corpus_name")?,
        ))
    }

    /// Bucket for the GCS object store
    pub fn storage_bucket(&self) -> Result<&str> {
        required(&self.storage.bucket, "storage.bucket")
    }

    /// Base URL of the RAG API
    pub fn backend_api_base(&self) -> Result<String> {
        if let Some(base) = &self.backend.api_base {
            return Ok(base.trim_end_matches('/').to_string());
        }
        let location = required(&self.corpus.location, "corpus.location")?;
        Ok(format!("https://{}-aiplatform.googleapis.com", location))
    }

    /// Base URL of the storage API
    pub fn storage_api_base(&self) -> String {
        self.storage
            .api_base
            .as_deref()
            .unwrap_or("https://storage.googleapis.com")
            .trim_end_matches('/')
            .to_string()
    }

    /// Get backend client timeout as Duration
    pub fn backend_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.timeout_secs)
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }
}

fn required<'a>(value: &'a Option<String>, key: &str) -> Result<&'a str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Configuration {
            message: format!("{} is required", key),
        })
}
