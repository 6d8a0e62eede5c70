//! Chat endpoint

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use std::time::Instant;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{ChatRequest, ChatResponse};

/// POST /chat - answer a question from the knowledge base
///
/// Requests that are not JSON, or carry no message, are rejected before any
/// retrieval or generation work.
pub async fn chat(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!("Rejected chat payload: {}", rejection);
        Error::malformed("Invalid request format. Please send JSON data.")
    })?;
    let question = request.question()?;

    let start = Instant::now();
    tracing::info!("Chat: \"{}\"", question);

    let top_k = state.config().retrieval.top_k;
    let contexts = state.retriever().retrieve(question, top_k).await?;
    let answer = state.generator().answer(question, &contexts).await;

    tracing::info!(
        "Chat answered in {}ms from {} chunks",
        start.elapsed().as_millis(),
        contexts.len()
    );

    Ok(Json(ChatResponse::new(answer)))
}
