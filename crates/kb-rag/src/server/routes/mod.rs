//! Routes for the knowledge-base server

pub mod chat;
pub mod retrieve;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::server::state::AppState;

/// Build the `/api` routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/retrieve", post(retrieve::retrieve))
        .route("/info", get(info))
}

/// API info endpoint
async fn info(State(state): State<AppState>) -> Json<Value> {
    let store = state.store();
    let report = state.load_report();

    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Question answering grounded in a preloaded knowledge base",
        "knowledge_base": {
            "records": store.len(),
            "dimensions": store.dimensions(),
            "embedder": state.embedder_name(),
            "loaded_at": report.loaded_at,
            "documents": store.documents(),
            "skipped": report.skipped,
        },
        "endpoints": {
            "POST /chat": "Answer a question ({\"message\": ...})",
            "POST /api/retrieve": "Ranked chunks for a query",
            "GET /api/info": "Service and knowledge base info",
            "GET /health": "Liveness",
            "GET /ready": "Readiness"
        }
    }))
}
