//! Query-time retrieval

use std::sync::Arc;

use crate::embeddings::EmbeddingProvider;
use crate::error::Result;

use super::store::{ScoredChunk, VectorIndex};

/// Embeds queries and ranks the index against them
pub struct Retriever<I: VectorIndex> {
    /// Read-only index built at startup
    index: Arc<I>,
    /// Embedding provider (the same one used for loading)
    embedder: Arc<dyn EmbeddingProvider>,
}

impl<I: VectorIndex> Clone for Retriever<I> {
    fn clone(&self) -> Self {
        Self {
            index: Arc::clone(&self.index),
            embedder: Arc::clone(&self.embedder),
        }
    }
}

impl<I: VectorIndex> Retriever<I> {
    /// Create a retriever over `index`
    pub fn new(index: Arc<I>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { index, embedder }
    }

    /// The underlying index
    pub fn index(&self) -> &I {
        &self.index
    }

    /// Texts of the `top_k` most similar chunks, best first
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<String>> {
        Ok(self
            .retrieve_scored(query, top_k)
            .await?
            .into_iter()
            .map(|scored| scored.record.text.clone())
            .collect())
    }

    /// The `top_k` most similar chunks with their scores
    ///
    /// An empty index (or `top_k == 0`) short-circuits without calling the
    /// embedder. Embedding failures propagate as `ModelUnavailable`.
    pub async fn retrieve_scored(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<ScoredChunk<'_>>> {
        if top_k == 0 || self.index.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query).await?;
        let results = self.index.search(&query_embedding, top_k);

        tracing::debug!(
            "Retrieved {} of {} chunks (best score {:.3})",
            results.len(),
            self.index.len(),
            results.first().map(|r| r.score).unwrap_or(0.0)
        );

        Ok(results)
    }
}
