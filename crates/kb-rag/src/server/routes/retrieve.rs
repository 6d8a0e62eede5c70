//! Retrieval-only endpoint for inspecting what a question would be grounded on

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use std::time::Instant;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{RetrieveRequest, RetrieveResponse, RetrievedChunk};

/// POST /api/retrieve - ranked chunks for a query, without generation
pub async fn retrieve(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RetrieveRequest>, JsonRejection>,
) -> Result<Json<RetrieveResponse>> {
    let Json(request) = payload
        .map_err(|_| Error::malformed("Invalid request format. Please send JSON data."))?;
    let query = request.query()?;
    let top_k = request.top_k.unwrap_or(state.config().retrieval.top_k);

    let start = Instant::now();
    let chunks: Vec<RetrievedChunk> = state
        .retriever()
        .retrieve_scored(query, top_k)
        .await?
        .into_iter()
        .map(RetrievedChunk::from)
        .collect();
    let processing_time_ms = start.elapsed().as_millis() as u64;

    tracing::debug!(
        "Retrieve \"{}\": {} chunks in {}ms",
        query,
        chunks.len(),
        processing_time_ms
    );

    Ok(Json(RetrieveResponse {
        chunks,
        processing_time_ms,
    }))
}
