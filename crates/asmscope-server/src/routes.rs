//! HTTP routes for asmscope server.

use std::sync::Arc;

use asmscope_core::Pipeline;
use axum::{
    Router,
    extract::State,
    response::Json,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

use crate::protocol::{CompileRequest, CompileResponse};

/// Application state shared across handlers.
pub struct AppState {
    /// Pipeline holding the ready compiler binary. Requests only read it.
    pub pipeline: Pipeline,
}

/// Create the router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/compile", post(compile_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Banner handler.
async fn index_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "asmscope compiler API",
        "endpoints": ["POST /compile", "GET /health"]
    }))
}

/// Health check handler.
async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Run one submission through the pipeline.
///
/// Always answers 200: compile and runtime problems are reported inside the
/// body, never as transport errors.
async fn compile_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CompileRequest>,
) -> Json<CompileResponse> {
    tracing::debug!("Compile request with {} bytes of source", request.code.len());
    let result = state.pipeline.run(&request.code).await;
    Json(CompileResponse::from(result))
}
