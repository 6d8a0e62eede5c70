//! Document ingestion: extraction, chunking and knowledge-base loading

mod chunker;
mod loader;
mod parser;

pub use chunker::{chunk_text, TextChunk, TextChunker};
pub use loader::{expand_locations, KnowledgeLoader, LoadReport, SkippedDocument};
pub use parser::{FileExtractor, TextExtractor};
