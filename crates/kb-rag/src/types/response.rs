//! Response types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::retrieval::ScoredChunk;

/// Body returned by `POST /chat`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Generated answer or a fixed degrade message
    pub response: String,
}

impl ChatResponse {
    /// Create a chat response
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

/// One ranked chunk in a retrieval response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    /// Chunk record id
    pub id: Uuid,
    /// Originating document
    pub source: String,
    /// Position within the document
    pub chunk_index: u32,
    /// Cosine similarity to the query
    pub score: f32,
    /// Chunk text
    pub text: String,
}

impl From<ScoredChunk<'_>> for RetrievedChunk {
    fn from(scored: ScoredChunk<'_>) -> Self {
        Self {
            id: scored.record.id,
            source: scored.record.source.clone(),
            chunk_index: scored.record.chunk_index,
            score: scored.score,
            text: scored.record.text.clone(),
        }
    }
}

/// Body returned by `POST /api/retrieve`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrieveResponse {
    /// Ranked chunks, best first
    pub chunks: Vec<RetrievedChunk>,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}
