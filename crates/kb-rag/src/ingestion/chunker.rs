//! Fixed-size text chunking with overlap
//!
//! Offsets are counted in characters (Unicode scalar values), so a chunk
//! boundary never falls inside a multi-byte character.

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};

/// A chunk of text with its character span in the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// Position within the document (0-based)
    pub index: u32,
    /// Chunk content
    pub text: String,
    /// First character of the chunk
    pub char_start: usize,
    /// One past the last character of the chunk
    pub char_end: usize,
}

/// Text chunker with configurable size and overlap
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    /// Chunk size in characters
    chunk_size: usize,
    /// Overlap between consecutive chunks
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker
    ///
    /// Fails with `InvalidConfiguration` unless `chunk_size > overlap`.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 || overlap >= chunk_size {
            return Err(Error::config(format!(
                "chunk_size ({}) must be greater than overlap ({})",
                chunk_size, overlap
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    /// Create a chunker from configuration
    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Chunk size in characters
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Overlap in characters
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Distance between the starts of consecutive chunks, always > 0
    pub fn step(&self) -> usize {
        self.chunk_size - self.overlap
    }

    /// Split text into overlapping chunks
    ///
    /// Empty text yields no chunks; text of at most `chunk_size` characters
    /// yields exactly one.
    pub fn chunk(&self, text: &str) -> Vec<TextChunk> {
        // Byte offset of every char, plus the end of the string, so that
        // char positions map straight to slice bounds.
        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let char_len = boundaries.len() - 1;

        let mut chunks = Vec::with_capacity(char_len / self.step() + 1);
        let mut start = 0usize;
        let mut index = 0u32;

        while start < char_len {
            let end = (start + self.chunk_size).min(char_len);
            chunks.push(TextChunk {
                index,
                text: text[boundaries[start]..boundaries[end]].to_string(),
                char_start: start,
                char_end: end,
            });
            index += 1;
            start += self.step();
        }

        chunks
    }
}

/// Split `text` into chunk strings of `chunk_size` characters overlapping by `overlap`
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>> {
    let chunker = TextChunker::new(chunk_size, overlap)?;
    Ok(chunker.chunk(text).into_iter().map(|c| c.text).collect())
}
