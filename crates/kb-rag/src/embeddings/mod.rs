//! Text embeddings
//!
//! [`EmbeddingProvider`] is the seam between the knowledge base and whatever
//! model produces vectors. Every provider returns [`Embedding`]s of exactly
//! `dimensions()` values, one per input text and in input order.

mod ollama;
#[cfg(feature = "onnx")]
mod onnx_embedder;

pub use ollama::OllamaEmbedder;
#[cfg(feature = "onnx")]
pub use onnx_embedder::OnnxEmbedder;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{EmbeddingBackend, EmbeddingConfig};
use crate::error::{Error, Result};

/// A fixed-length embedding vector
///
/// The length is set at construction and cannot change afterwards; the
/// knowledge store checks it against the store dimensionality on insert.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding(Box<[f32]>);

impl Embedding {
    /// Wrap a vector
    pub fn new(values: Vec<f32>) -> Self {
        Self(values.into_boxed_slice())
    }

    /// A vector of `dimensions` zeros
    pub fn zeros(dimensions: usize) -> Self {
        Self::new(vec![0.0; dimensions])
    }

    /// Number of components
    pub fn dimensions(&self) -> usize {
        self.0.len()
    }

    /// Components as a slice
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Euclidean norm
    pub fn magnitude(&self) -> f32 {
        self.0.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    /// Cosine similarity with another embedding
    ///
    /// Returns 0.0 when either vector has zero magnitude, when the lengths
    /// differ, or when the result is not a number.
    pub fn cosine_similarity(&self, other: &Embedding) -> f32 {
        cosine_similarity(&self.0, &other.0)
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(values: Vec<f32>) -> Self {
        Self::new(values)
    }
}

/// Cosine similarity between two vectors, 0.0 for degenerate input
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let similarity = dot / (norm_a * norm_b);
    if similarity.is_nan() {
        0.0
    } else {
        similarity
    }
}

/// Trait for generating text embeddings
///
/// Implementations:
/// - `OllamaEmbedder`: Ollama server (`all-minilm`, `nomic-embed-text`, ...)
/// - `OnnxEmbedder`: local all-MiniLM-L6-v2 (feature `onnx`)
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embeddings for multiple texts, preserving order
    ///
    /// Any failure is reported as `Error::ModelUnavailable`.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>>;

    /// Generate embedding for a single text
    async fn embed(&self, text: &str) -> Result<Embedding> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::model_unavailable("Empty embedding result"))
    }

    /// Embedding dimensions
    fn dimensions(&self) -> usize;

    /// Check if the provider is reachable
    async fn health_check(&self) -> Result<bool>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

/// Check a provider's output against the batch it was asked to embed
pub(crate) fn check_batch(
    embeddings: Vec<Vec<f32>>,
    expected_count: usize,
    dimensions: usize,
) -> Result<Vec<Embedding>> {
    if embeddings.len() != expected_count {
        return Err(Error::model_unavailable(format!(
            "Expected {} embeddings, got {}",
            expected_count,
            embeddings.len()
        )));
    }

    embeddings
        .into_iter()
        .map(|values| {
            if values.len() != dimensions {
                Err(Error::model_unavailable(format!(
                    "Expected {}-dimensional embedding, got {}",
                    dimensions,
                    values.len()
                )))
            } else {
                Ok(Embedding::new(values))
            }
        })
        .collect()
}

/// Run a CPU-bound embedding pass off the runtime and check its output
///
/// A panic inside `embed` surfaces as `ModelUnavailable`.
#[cfg_attr(not(feature = "onnx"), allow(dead_code))]
pub(crate) async fn embed_blocking<F>(
    expected_count: usize,
    dimensions: usize,
    embed: F,
) -> Result<Vec<Embedding>>
where
    F: FnOnce() -> Result<Vec<Vec<f32>>> + Send + 'static,
{
    let raw = tokio::task::spawn_blocking(embed)
        .await
        .map_err(|e| Error::model_unavailable(format!("Embedding task failed: {}", e)))??;
    check_batch(raw, expected_count, dimensions)
}

/// Build the configured embedding provider
pub async fn from_config(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    match config.backend {
        EmbeddingBackend::Ollama => Ok(Arc::new(OllamaEmbedder::new(config)?)),
        #[cfg(feature = "onnx")]
        EmbeddingBackend::Onnx => Ok(Arc::new(OnnxEmbedder::new(config).await?)),
        #[cfg(not(feature = "onnx"))]
        EmbeddingBackend::Onnx => Err(Error::config(
            "embeddings.backend = \"onnx\" requires building with the `onnx` feature",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = Embedding::new(vec![1.0, 0.0]);
        let b = Embedding::new(vec![0.0, 1.0]);
        let c = Embedding::new(vec![2.0, 0.0]);
        let d = Embedding::new(vec![-1.0, 0.0]);

        assert!((a.cosine_similarity(&c) - 1.0).abs() < 1e-6);
        assert!(a.cosine_similarity(&b).abs() < 1e-6);
        assert!((a.cosine_similarity(&d) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_vector_similarity_is_zero() {
        let zero = Embedding::zeros(3);
        let q = Embedding::new(vec![0.3, -0.2, 0.9]);
        assert_eq!(zero.cosine_similarity(&q), 0.0);
        assert_eq!(q.cosine_similarity(&zero), 0.0);
        assert_eq!(zero.cosine_similarity(&zero), 0.0);
    }

    #[test]
    fn test_mismatched_lengths() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn test_check_batch() {
        let ok = check_batch(vec![vec![0.1, 0.2], vec![0.3, 0.4]], 2, 2).unwrap();
        assert_eq!(ok.len(), 2);
        assert_eq!(ok[1].as_slice(), [0.3f32, 0.4].as_slice());

        assert!(matches!(
            check_batch(vec![vec![0.1, 0.2]], 2, 2),
            Err(Error::ModelUnavailable(_))
        ));
        assert!(matches!(
            check_batch(vec![vec![0.1]], 1, 2),
            Err(Error::ModelUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_embed_blocking_counts_requested_texts() {
        // The model dropped one of the three requested texts
        let short = embed_blocking(3, 2, || Ok(vec![vec![0.1, 0.2], vec![0.3, 0.4]])).await;
        assert!(matches!(short, Err(Error::ModelUnavailable(_))));

        let ok = embed_blocking(2, 2, || Ok(vec![vec![0.1, 0.2], vec![0.3, 0.4]]))
            .await
            .unwrap();
        assert_eq!(ok.len(), 2);
    }

    #[tokio::test]
    async fn test_embed_blocking_panic_is_model_unavailable() {
        let err = embed_blocking(1, 2, || -> Result<Vec<Vec<f32>>> {
            panic!("session poisoned")
        })
        .await
        .unwrap_err();
        assert!(matches!(err, Error::ModelUnavailable(_)));
    }
}
