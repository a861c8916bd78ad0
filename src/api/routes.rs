//! API route definitions

use axum::routing::get;
use axum::routing::post;
use axum::Router;

use super::handlers::AppState;
use super::handlers::{
    self,
};

/// Create RESTful API router
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Solving pipeline (SSE)
        .route("/solve", post(handlers::solve))
        // Session debugging
        .route("/context/:session_id", get(handlers::get_context))
        .with_state(state)
}
