//! Request types

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Body of `POST /chat`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user's question
    #[serde(default)]
    pub message: Option<String>,
}

impl ChatRequest {
    /// Create a chat request
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }

    /// The trimmed question, or a client error when it is missing or blank
    pub fn question(&self) -> Result<&str> {
        self.message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .ok_or_else(|| Error::malformed("Please type a message!"))
    }
}

/// Body of `POST /api/retrieve`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrieveRequest {
    /// Text to search for
    #[serde(default)]
    pub query: Option<String>,
    /// Number of chunks to return (defaults to the configured top_k)
    #[serde(default)]
    pub top_k: Option<usize>,
}

impl RetrieveRequest {
    /// The trimmed query, or a client error when it is missing or blank
    pub fn query(&self) -> Result<&str> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| Error::malformed("Query must not be empty"))
    }
}
