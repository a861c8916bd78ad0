//! HTTP server implementation

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use tokio::sync::Mutex;
use tower_http::compression::CompressionLayer;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing::warn;

use crate::agent::MathAgent;
use crate::api::handlers::AppState;
use crate::api::routes;
use crate::config::AppConfig;
use crate::kb::load_problems;
use crate::kb::KnowledgeBase;
use crate::llm::LlmService;
use crate::session::SessionStore;
use crate::streaming::StreamManager;
use crate::websearch::default_aggregator;
use crate::Result;

/// Build the knowledge base from the configured dataset.
///
/// A missing or empty dataset is not fatal: the index stays empty and every
/// question routes to web search.
fn build_knowledge_base(config: &AppConfig) -> Arc<KnowledgeBase> {
    let kb = Arc::new(KnowledgeBase::new(
        config.knowledge_base.max_features,
        Some(PathBuf::from(config.vectorizer_path())),
    ));

    match load_problems(config.dataset_path(), config.knowledge_base.ingest_limit) {
        Ok(records) => {
            if let Err(e) = kb.ingest(records) {
                warn!("Knowledge-base ingestion failed: {}", e);
            }
        }
        Err(e) => {
            warn!(
                "Dataset not loaded from {}: {}; continuing with web search only",
                config.dataset_path(),
                e
            );
        }
    }

    kb
}

/// Assemble the solving pipeline from configuration.
pub fn build_agent(config: &AppConfig) -> Result<MathAgent> {
    let kb = build_knowledge_base(config);
    let aggregator = Arc::new(default_aggregator(&config.websearch)?);
    let llm = Arc::new(LlmService::new(&config.llm)?);

    Ok(MathAgent::new(
        kb,
        aggregator,
        llm,
        config.agent.clone(),
        config.knowledge_base.top_k,
        config.websearch.max_results_per_provider,
    ))
}

/// Start the API server
pub async fn serve_api(config: &AppConfig, host: String, port: u16, enable_cors: bool) -> Result<()> {
    info!("🚀 Starting MathRAG API server...");

    let state = AppState {
        agent: Arc::new(build_agent(config)?),
        sessions: Arc::new(SessionStore::new()),
        streams: Arc::new(StreamManager::new()),
        solve_gate: Arc::new(Mutex::new(())),
    };

    let mut app = Router::new().nest("/api", routes::api_routes(state));

    // Add middleware layers
    app = app
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new());

    // Add CORS if enabled
    if enable_cors {
        info!("✅ CORS enabled");
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    // Start server
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🌐 API server listening on http://{}", addr);
    info!("Available endpoints:");
    info!("  GET  /api/health               - Health check");
    info!("  POST /api/solve                - Solve a question (SSE stream)");
    info!("  GET  /api/context/:session_id  - Session history");

    axum::serve(listener, app).await?;

    Ok(())
}
