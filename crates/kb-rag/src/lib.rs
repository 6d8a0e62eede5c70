//! kb-rag: question answering grounded in a preloaded knowledge base
//!
//! Documents are split into overlapping character chunks, embedded once at
//! startup and held in memory. Each question is embedded, the closest chunks
//! by cosine similarity are retrieved, and a chat-completions API answers
//! from that context.

pub mod config;
pub mod embeddings;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod retrieval;
pub mod retry;
pub mod server;
pub mod types;

pub use config::RagConfig;
pub use embeddings::{Embedding, EmbeddingProvider};
pub use error::{Error, Result};
pub use generation::{AnswerGenerator, LlmProvider};
pub use ingestion::{chunk_text, KnowledgeLoader, TextChunker};
pub use retrieval::{KnowledgeStore, Retriever};
pub use types::{ChatRequest, ChatResponse, ChunkRecord};
