//! Error types for the knowledge-base service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for kb-rag operations
pub type Result<T> = std::result::Result<T, Error>;

/// kb-rag errors
#[derive(Debug, Error)]
pub enum Error {
    /// Chunking, embedding or server settings that cannot work
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Text could not be extracted from one document
    #[error("Failed to extract text from '{source_id}': {message}")]
    ExtractionFailure { source_id: String, message: String },

    /// The embedding model could not produce vectors
    #[error("Embedding model unavailable: {0}")]
    ModelUnavailable(String),

    /// A vector of the wrong length reached the knowledge store
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The remote generation API failed
    #[error("Generation API failure: {0}")]
    GenerationApiFailure(String),

    /// Inbound request was not acceptable
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an invalid configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }

    /// Create an extraction error for one document
    pub fn extraction(source_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExtractionFailure {
            source_id: source_id.into(),
            message: message.into(),
        }
    }

    /// Create a model unavailable error
    pub fn model_unavailable(message: impl Into<String>) -> Self {
        Self::ModelUnavailable(message.into())
    }

    /// Create a generation API error
    pub fn generation(message: impl Into<String>) -> Self {
        Self::GenerationApiFailure(message.into())
    }

    /// Create a malformed request error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedRequest(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            Error::MalformedRequest(_) => (StatusCode::BAD_REQUEST, "malformed_request"),
            Error::InvalidConfiguration(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "config_error")
            }
            Error::ExtractionFailure { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "extraction_error")
            }
            Error::ModelUnavailable(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "embedding_error")
            }
            Error::DimensionMismatch { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "dimension_error")
            }
            Error::GenerationApiFailure(_) => (StatusCode::BAD_GATEWAY, "generation_error"),
            Error::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
            Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        // Client errors carry just the reason; server errors are prefixed
        // the way the chat frontend expects.
        let message = match &self {
            Error::MalformedRequest(reason) => reason.clone(),
            other => format!("Error: {}", other),
        };

        let body = Json(json!({
            "response": message,
            "error": {
                "type": error_type,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}
