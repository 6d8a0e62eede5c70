//! Chunk records and source document summaries

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::embeddings::Embedding;

/// File types the knowledge base can extract text from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document
    Pdf,
    /// Plain text file
    Txt,
    /// Markdown file
    Markdown,
    /// Unknown file type
    Unknown,
}

impl FileType {
    /// Detect file type from extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "txt" | "text" => Self::Txt,
            "md" | "markdown" => Self::Markdown,
            _ => Self::Unknown,
        }
    }

    /// Detect file type from a path or filename
    pub fn from_path(path: &std::path::Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Unknown)
    }

    /// Check if this is a supported file type
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

/// One retrievable unit of the knowledge base
///
/// Created once during loading and never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkRecord {
    /// Process-unique identifier
    pub id: Uuid,
    /// Chunk text
    pub text: String,
    /// Vector for `text`; excluded from API payloads
    #[serde(skip)]
    pub embedding: Embedding,
    /// Originating document
    pub source: String,
    /// Position of this chunk within its document (0-based)
    pub chunk_index: u32,
    /// Character offset where the chunk starts in the extracted text
    pub char_start: usize,
    /// Character offset where the chunk ends (exclusive)
    pub char_end: usize,
}

impl ChunkRecord {
    /// Create a record with a fresh id
    pub fn new(
        source: impl Into<String>,
        chunk_index: u32,
        text: impl Into<String>,
        embedding: Embedding,
        char_start: usize,
        char_end: usize,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            embedding,
            source: source.into(),
            chunk_index,
            char_start,
            char_end,
        }
    }
}

/// Summary of one document that made it into the knowledge base
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceDocument {
    /// Document identifier (its configured path)
    pub source: String,
    /// Detected file type
    pub file_type: FileType,
    /// Number of chunk records produced
    pub chunk_count: usize,
    /// Number of characters of extracted text
    pub char_count: usize,
    /// SHA-256 of the extracted text
    pub content_hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_file_type_detection() {
        assert_eq!(FileType::from_path(Path::new("kb/doc1.PDF")), FileType::Pdf);
        assert_eq!(FileType::from_path(Path::new("notes.md")), FileType::Markdown);
        assert_eq!(FileType::from_path(Path::new("readme.txt")), FileType::Txt);
        assert_eq!(FileType::from_path(Path::new("Makefile")), FileType::Unknown);
        assert!(!FileType::from_extension("docx").is_supported());
    }

    #[test]
    fn test_records_get_unique_ids() {
        let a = ChunkRecord::new("doc", 0, "a", Embedding::new(vec![1.0]), 0, 1);
        let b = ChunkRecord::new("doc", 1, "b", Embedding::new(vec![1.0]), 1, 2);
        assert_ne!(a.id, b.id);
    }
}
