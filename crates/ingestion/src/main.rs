//! Question RAG Ingestion
//!
//! One-shot batch run:
//! 1. Loads the concept matcher dataset
//! 2. Normalizes it into tagged question documents
//! 3. Persists the normalized metadata
//! 4. Renders the tagged corpus file
//! 5. Stages the corpus and requests a backend import

mod errors;
mod loader;
mod normalizer;
mod pipeline;

use anyhow::Context;
use pipeline::IngestionPipeline;
use question_rag_common::{
    backend::create_importer, config::AppConfig, storage::create_object_store, telemetry, VERSION,
};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Initialize tracing
    telemetry::init_tracing(&config.observability)?;

    info!("Starting Question RAG Ingestion v{}", VERSION);

    config.validate()?;

    let store = create_object_store(&config)?;
    let importer = create_importer(&config)?;
    let pipeline = IngestionPipeline::new(&config, store, importer)?;

    let report = pipeline.run().await.map_err(|e| {
        tracing::error!(error = %e, "Ingestion failed");
        e
    })?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
