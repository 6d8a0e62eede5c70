//! Application state for the knowledge-base server

use parking_lot::RwLock;
use std::sync::Arc;

use crate::config::RagConfig;
use crate::embeddings::{self, EmbeddingProvider};
use crate::error::Result;
use crate::generation::{AnswerGenerator, ChatCompletionClient, LlmProvider};
use crate::ingestion::{FileExtractor, KnowledgeLoader, LoadReport, TextChunker};
use crate::retrieval::{KnowledgeStore, Retriever};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Retriever over the loaded knowledge base
    retriever: Retriever<KnowledgeStore>,
    /// Answer generator
    generator: AnswerGenerator,
    /// Embedding provider name, for `/api/info`
    embedder_name: String,
    /// What the startup load produced
    load_report: LoadReport,
    /// Ready state
    ready: RwLock<bool>,
}

impl AppState {
    /// Build the providers from configuration and load the knowledge base
    ///
    /// Returns once every configured document has been processed; the state
    /// is ready on return.
    pub async fn new(config: RagConfig) -> Result<Self> {
        tracing::info!("Initializing application state...");

        let chunker = TextChunker::from_config(&config.chunking)?;

        let embedder = embeddings::from_config(&config.embeddings).await?;
        if !embedder.health_check().await? {
            tracing::warn!(
                "Embedding backend {} at {} is not responding",
                embedder.name(),
                config.embeddings.base_url
            );
        }
        tracing::info!(
            "Embedding provider initialized ({}, {} dimensions)",
            embedder.name(),
            embedder.dimensions()
        );

        let loader = KnowledgeLoader::new(chunker, embedder.clone(), Arc::new(FileExtractor));
        let (store, report) = loader.load(&config.knowledge_base.documents).await?;

        let llm = Arc::new(ChatCompletionClient::new(&config.llm)?);
        tracing::info!("Generation client initialized ({})", config.llm.model);

        Ok(Self::from_parts(config, store, embedder, llm, report))
    }

    /// Assemble state from an already loaded store
    pub fn from_parts(
        config: RagConfig,
        store: KnowledgeStore,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
        load_report: LoadReport,
    ) -> Self {
        let embedder_name = embedder.name().to_string();
        Self {
            inner: Arc::new(AppStateInner {
                config,
                retriever: Retriever::new(Arc::new(store), embedder),
                generator: AnswerGenerator::new(llm),
                embedder_name,
                load_report,
                ready: RwLock::new(true),
            }),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Get the retriever
    pub fn retriever(&self) -> &Retriever<KnowledgeStore> {
        &self.inner.retriever
    }

    /// Get the loaded knowledge store
    pub fn store(&self) -> &KnowledgeStore {
        self.inner.retriever.index()
    }

    /// Get the answer generator
    pub fn generator(&self) -> &AnswerGenerator {
        &self.inner.generator
    }

    /// Name of the embedding provider
    pub fn embedder_name(&self) -> &str {
        &self.inner.embedder_name
    }

    /// Report from the startup load
    pub fn load_report(&self) -> &LoadReport {
        &self.inner.load_report
    }

    /// Check if the server is ready
    pub fn is_ready(&self) -> bool {
        *self.inner.ready.read()
    }

    /// Set ready state
    pub fn set_ready(&self, ready: bool) {
        *self.inner.ready.write() = ready;
    }
}
