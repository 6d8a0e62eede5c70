//! Core types for the knowledge-base service

pub mod document;
pub mod query;
pub mod response;

pub use document::{ChunkRecord, FileType, SourceDocument};
pub use query::{ChatRequest, RetrieveRequest};
pub use response::{ChatResponse, RetrieveResponse, RetrievedChunk};
