//! Metrics and observability utilities
//!
//! Provides Prometheus-style metrics for ingestion runs and retrieval
//! queries with standardized naming conventions.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all Question RAG metrics
pub const METRICS_PREFIX: &str = "question_rag";

/// Histogram buckets for retrieval latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.010, // 10ms
    0.025, // 25ms
    0.050, // 50ms
    0.100, // 100ms
    0.250, // 250ms
    0.500, // 500ms
    1.000, // 1s
    2.500, // 2.5s
    5.000, // 5s
    10.00, // 10s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Retrieval metrics
    describe_counter!(
        format!("{}_retrieval_queries_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of retrieval queries by mode"
    );

    describe_histogram!(
        format!("{}_retrieval_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Retrieval latency in seconds"
    );

    describe_gauge!(
        format!("{}_retrieval_results_count", METRICS_PREFIX),
        Unit::Count,
        "Number of documents returned by the last query"
    );

    describe_counter!(
        format!("{}_concept_fallbacks_total", METRICS_PREFIX),
        Unit::Count,
        "Concept searches that fell back to unfiltered results"
    );

    describe_counter!(
        format!("{}_id_lookup_misses_total", METRICS_PREFIX),
        Unit::Count,
        "Id lookups with no match in the candidate window"
    );

    describe_counter!(
        format!("{}_backend_errors_total", METRICS_PREFIX),
        Unit::Count,
        "Search backend failures"
    );

    // Ingestion metrics
    describe_counter!(
        format!("{}_documents_ingested_total", METRICS_PREFIX),
        Unit::Count,
        "Total question documents ingested"
    );

    describe_histogram!(
        format!("{}_ingestion_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Ingestion run latency in seconds"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record one retrieval query
pub struct QueryMetrics {
    start: Instant,
    mode: &'static str,
}

impl QueryMetrics {
    /// Start tracking a query
    pub fn start(mode: &'static str) -> Self {
        Self {
            start: Instant::now(),
            mode,
        }
    }

    /// Record query completion
    pub fn finish(self, result_count: usize) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_retrieval_queries_total", METRICS_PREFIX),
            "mode" => self.mode
        )
        .increment(1);

        histogram!(
            format!("{}_retrieval_duration_seconds", METRICS_PREFIX),
            "mode" => self.mode
        )
        .record(duration);

        gauge!(
            format!("{}_retrieval_results_count", METRICS_PREFIX),
            "mode" => self.mode
        )
        .set(result_count as f64);
    }
}

/// Record a concept search that returned unfiltered results
pub fn record_concept_fallback() {
    counter!(format!("{}_concept_fallbacks_total", METRICS_PREFIX)).increment(1);
}

/// Record an id lookup that found nothing
pub fn record_id_miss() {
    counter!(format!("{}_id_lookup_misses_total", METRICS_PREFIX)).increment(1);
}

/// Record a backend failure
pub fn record_backend_error(backend: &str) {
    counter!(
        format!("{}_backend_errors_total", METRICS_PREFIX),
        "backend" => backend.to_string()
    )
    .increment(1);
}

/// Helper to record ingestion metrics
pub fn record_ingestion(duration_secs: f64, documents: usize) {
    counter!(format!("{}_documents_ingested_total", METRICS_PREFIX)).increment(documents as u64);

    histogram!(format!("{}_ingestion_duration_seconds", METRICS_PREFIX)).record(duration_secs);
}
