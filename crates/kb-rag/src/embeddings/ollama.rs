//! Ollama embedding client with batching and retry

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};
use crate::retry::retry_request;

use super::{check_batch, Embedding, EmbeddingProvider};

/// Ollama `/api/embed` client
pub struct OllamaEmbedder {
    /// HTTP client
    client: Client,
    /// Ollama base URL
    base_url: String,
    /// Embedding model name
    model: String,
    /// Expected vector length
    dimensions: usize,
    /// Texts per request
    batch_size: usize,
    /// Maximum retries
    max_retries: u32,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaEmbedder {
    /// Create a new Ollama embedder
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            dimensions: config.dimensions,
            batch_size: config.batch_size.max(1),
            max_retries: config.max_retries,
        })
    }

    /// Embed one request-sized batch
    async fn embed_request(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        let url = format!("{}/api/embed", self.base_url);
        let url = url.as_str();

        let embeddings = retry_request("Embedding request", self.max_retries, move || async move {
            let request = EmbedRequest {
                model: &self.model,
                input: texts,
            };

            let response = self
                .client
                .post(url)
                .json(&request)
                .send()
                .await
                .map_err(|e| {
                    Error::model_unavailable(format!("Embedding request failed: {}", e))
                })?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(Error::model_unavailable(format!(
                    "Embedding failed: HTTP {} - {}",
                    status, body
                )));
            }

            let embed_response: EmbedResponse = response.json().await.map_err(|e| {
                Error::model_unavailable(format!("Failed to parse embedding response: {}", e))
            })?;

            Ok(embed_response.embeddings)
        })
        .await?;

        check_batch(embeddings, texts.len(), self.dimensions)
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut all_embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            all_embeddings.extend(self.embed_request(batch).await?);
        }

        tracing::debug!("Embedded {} texts with {}", texts.len(), self.model);
        Ok(all_embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::post, Json, Router};
    use serde_json::{json, Value};

    /// Serve a fake `/api/embed` that returns `[len(text), 1.0]` per input
    async fn spawn_fake_ollama() -> String {
        async fn embed(Json(body): Json<Value>) -> Json<Value> {
            let vectors: Vec<Value> = body["input"]
                .as_array()
                .map(|inputs| {
                    inputs
                        .iter()
                        .map(|t| json!([t.as_str().unwrap_or("").len() as f32, 1.0]))
                        .collect()
                })
                .unwrap_or_default();
            Json(json!({ "model": "all-minilm", "embeddings": vectors }))
        }

        let app = Router::new().route("/api/embed", post(embed));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn test_config(base_url: String) -> EmbeddingConfig {
        EmbeddingConfig {
            base_url,
            dimensions: 2,
            batch_size: 2,
            max_retries: 0,
            timeout_secs: 5,
            ..EmbeddingConfig::default()
        }
    }

    #[tokio::test]
    async fn test_batches_preserve_order() {
        let embedder = OllamaEmbedder::new(&test_config(spawn_fake_ollama().await)).unwrap();
        let texts: Vec<String> = ["a", "bbb", "cc", "dddd", "e"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let embeddings = embedder.embed_batch(&texts).await.unwrap();

        let firsts: Vec<f32> = embeddings.iter().map(|e| e.as_slice()[0]).collect();
        assert_eq!(firsts, vec![1.0, 3.0, 2.0, 4.0, 1.0]);
        assert!(embeddings.iter().all(|e| e.dimensions() == 2));
    }

    #[tokio::test]
    async fn test_wrong_dimensions_is_model_unavailable() {
        let mut config = test_config(spawn_fake_ollama().await);
        config.dimensions = 384;
        let embedder = OllamaEmbedder::new(&config).unwrap();

        let err = embedder.embed("hello").await.unwrap_err();
        assert!(matches!(err, Error::ModelUnavailable(_)));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_model_unavailable() {
        let embedder =
            OllamaEmbedder::new(&test_config("http://127.0.0.1:1".to_string())).unwrap();

        let err = embedder.embed("hello").await.unwrap_err();
        assert!(matches!(err, Error::ModelUnavailable(_)));
        assert!(!embedder.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_request() {
        let embedder =
            OllamaEmbedder::new(&test_config("http://127.0.0.1:1".to_string())).unwrap();
        assert!(embedder.embed_batch(&[]).await.unwrap().is_empty());
    }
}
