//! Question RAG Search Service
//!
//! Tool-facing HTTP service over the retrieval refinement layer:
//! - Free-text question search
//! - Exact-concept search with unfiltered fallback
//! - Best-effort lookup by question id
//! - Prometheus metrics (optional)

mod handlers;
mod retrieval;
mod tools;

use axum::{
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use question_rag_common::{
    backend::create_backend,
    config::AppConfig,
    metrics::{self, LATENCY_BUCKETS},
    telemetry, VERSION,
};
use retrieval::QuestionRetriever;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub retriever: Arc<QuestionRetriever>,
    pub default_top_k: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load()?;

    // Initialize tracing
    telemetry::init_tracing(&config.observability)?;

    info!("Starting Question RAG Search Service v{}", VERSION);

    config.validate().map_err(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        e
    })?;

    // Initialize metrics
    if config.observability.metrics_port != 0 {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .set_buckets_for_metric(Matcher::Suffix("duration_seconds".to_string()), LATENCY_BUCKETS)?
            .install()?;
        metrics::register_metrics();
        info!("Prometheus metrics on {}", addr);
    }

    // Connect the search backend
    let backend = create_backend(&config).await?;
    info!(backend = backend.name(), "Search backend ready");

    let state = AppState {
        retriever: Arc::new(QuestionRetriever::new(backend)),
        default_top_k: config.retrieval.default_top_k,
    };

    let app = create_router(state, config.request_timeout());

    let listener =
        tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Search service shutdown complete");
    Ok(())
}

/// Create the main application router
fn create_router(state: AppState, request_timeout: Duration) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let tool_routes = Router::new()
        .route("/tools", get(handlers::tools::list_tools))
        .route(
            "/tools/retrieve_exam_questions",
            post(handlers::tools::retrieve_exam_questions),
        )
        .route(
            "/tools/retrieve_questions_by_concept",
            post(handlers::tools::retrieve_questions_by_concept),
        )
        .route(
            "/tools/retrieve_question_by_id",
            post(handlers::tools::retrieve_question_by_id),
        );

    Router::new()
        .route("/health", get(handlers::health::health))
        .nest("/v1", tool_routes)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(propagate_id)
        .layer(request_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
