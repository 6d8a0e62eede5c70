//! Local ONNX sentence embeddings
//!
//! Runs a sentence-transformers model (all-MiniLM-L6-v2 by default, 384
//! dimensions) through ONNX Runtime. Model and tokenizer are fetched from
//! HuggingFace into the cache directory on first use.

use async_trait::async_trait;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tokenizers::Tokenizer;

use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};

use super::{embed_blocking, Embedding, EmbeddingProvider};

/// HuggingFace model used when the configured name is the Ollama alias
const DEFAULT_MODEL: &str = "all-MiniLM-L6-v2";

struct OnnxModel {
    session: Session,
    tokenizer: Tokenizer,
}

/// ONNX-based text embedder
pub struct OnnxEmbedder {
    /// Session and tokenizer; inference needs exclusive access
    model: Arc<Mutex<OnnxModel>>,
    /// Embedding dimensions
    dimensions: usize,
    /// Maximum sequence length
    max_length: usize,
    /// Batch size
    batch_size: usize,
}

impl OnnxEmbedder {
    /// Load (downloading if needed) the configured model
    pub async fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model_name = match config.model.as_str() {
            "all-minilm" | "" => DEFAULT_MODEL,
            name => name,
        };
        tracing::info!("Initializing ONNX embedder with model: {}", model_name);

        let cache_dir = config.cache_dir.join(model_name);
        std::fs::create_dir_all(&cache_dir).map_err(|e| {
            Error::config(format!("Failed to create cache directory: {}", e))
        })?;

        let model_path = cache_dir.join("model.onnx");
        let tokenizer_path = cache_dir.join("tokenizer.json");

        if !model_path.exists() {
            download_file(model_name, "onnx/model.onnx", &model_path).await?;
        }
        if !tokenizer_path.exists() {
            download_file(model_name, "tokenizer.json", &tokenizer_path).await?;
        }

        fn unavailable(what: &str, e: impl std::fmt::Display) -> Error {
            Error::model_unavailable(format!("{}: {}", what, e))
        }
        let session = Session::builder()
            .map_err(|e| unavailable("Failed to create session builder", e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| unavailable("Failed to set optimization level", e))?
            .with_intra_threads(4)
            .map_err(|e| unavailable("Failed to set threads", e))?
            .commit_from_file(&model_path)
            .map_err(|e| unavailable("Failed to load model", e))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| Error::model_unavailable(format!("Failed to load tokenizer: {}", e)))?;

        tracing::info!("ONNX embedder initialized");

        Ok(Self {
            model: Arc::new(Mutex::new(OnnxModel { session, tokenizer })),
            dimensions: config.dimensions,
            max_length: config.max_length,
            batch_size: config.batch_size.max(1),
        })
    }
}

impl OnnxModel {
    /// Tokenize, run the model, mean-pool over the attention mask, L2-normalize
    fn embed(&mut self, texts: &[String], max_length: usize) -> Result<Vec<Vec<f32>>> {
        let batch_size = texts.len();

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| Error::model_unavailable(format!("Tokenization failed: {}", e)))?;

        let max_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0)
            .min(max_length);

        let mut input_ids = vec![0i64; batch_size * max_len];
        let mut attention_mask = vec![0i64; batch_size * max_len];
        let mut token_type_ids = vec![0i64; batch_size * max_len];

        for (i, encoding) in encodings.iter().enumerate() {
            let ids = encoding.get_ids();
            let mask = encoding.get_attention_mask();
            let types = encoding.get_type_ids();

            for j in 0..ids.len().min(max_len) {
                input_ids[i * max_len + j] = ids[j] as i64;
                attention_mask[i * max_len + j] = mask[j] as i64;
                token_type_ids[i * max_len + j] = types[j] as i64;
            }
        }

        let shape = vec![batch_size, max_len];
        let tensor = |data: Vec<i64>, what: &str| {
            Tensor::from_array((shape.clone(), data.into_boxed_slice())).map_err(|e| {
                Error::model_unavailable(format!("{} tensor creation failed: {}", what, e))
            })
        };

        let inputs = vec![
            ("input_ids", tensor(input_ids, "Input")?.into_dyn()),
            ("attention_mask", tensor(attention_mask.clone(), "Attention mask")?.into_dyn()),
            ("token_type_ids", tensor(token_type_ids, "Token type")?.into_dyn()),
        ];

        let outputs = self
            .session
            .run(inputs)
            .map_err(|e| Error::model_unavailable(format!("Inference failed: {}", e)))?;

        let output_iter: Vec<_> = outputs.iter().collect();
        let output = output_iter
            .iter()
            .find(|(name, _)| *name == "last_hidden_state")
            .or_else(|| output_iter.first())
            .map(|(_, v)| v)
            .ok_or_else(|| Error::model_unavailable("No output tensor"))?;

        let (tensor_shape, hidden) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| Error::model_unavailable(format!("Failed to extract tensor: {}", e)))?;

        let hidden_size = tensor_shape
            .get(2)
            .map(|&d| d as usize)
            .ok_or_else(|| Error::model_unavailable("Unexpected output tensor shape"))?;

        let mut embeddings = Vec::with_capacity(batch_size);
        for i in 0..batch_size {
            let mut pooled = vec![0.0f32; hidden_size];
            let mut count = 0.0f32;

            for j in 0..max_len {
                if attention_mask[i * max_len + j] == 0 {
                    continue;
                }
                let row = (i * max_len + j) * hidden_size;
                for (k, value) in pooled.iter_mut().enumerate() {
                    if let Some(h) = hidden.get(row + k) {
                        *value += h;
                    }
                }
                count += 1.0;
            }

            if count > 0.0 {
                pooled.iter_mut().for_each(|v| *v /= count);
            }

            let norm: f32 = pooled.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm > 0.0 {
                pooled.iter_mut().for_each(|v| *v /= norm);
            }

            embeddings.push(pooled);
        }

        Ok(embeddings)
    }
}

#[async_trait]
impl EmbeddingProvider for OnnxEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = Arc::clone(&self.model);
        let expected = texts.len();
        let texts = texts.to_vec();
        let batch_size = self.batch_size;
        let max_length = self.max_length;

        embed_blocking(expected, self.dimensions, move || {
            let mut model = model.lock();
            let mut all = Vec::with_capacity(texts.len());
            for batch in texts.chunks(batch_size) {
                all.extend(model.embed(batch, max_length)?);
            }
            Ok(all)
        })
        .await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "onnx"
    }
}

/// Download one file of a sentence-transformers model repository
async fn download_file(model_name: &str, remote_path: &str, path: &Path) -> Result<()> {
    let url = format!(
        "https://huggingface.co/sentence-transformers/{}/resolve/main/{}",
        model_name, remote_path
    );

    tracing::info!("Downloading {}", url);

    let response = reqwest::get(&url).await.map_err(|e| {
        Error::model_unavailable(format!("Failed to download {}: {}", remote_path, e))
    })?;

    if !response.status().is_success() {
        return Err(Error::model_unavailable(format!(
            "Download of {} failed: HTTP {}",
            remote_path,
            response.status()
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| {
            Error::model_unavailable(format!("Failed to read {}: {}", remote_path, e))
        })?;

    tokio::fs::write(path, &bytes).await?;

    tracing::info!("Downloaded {} ({} bytes)", remote_path, bytes.len());

    Ok(())
}
