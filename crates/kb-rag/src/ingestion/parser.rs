//! Text extraction from knowledge-base documents

use async_trait::async_trait;
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::FileType;

/// Resolves a document location to its raw text
///
/// Failures are per-document: the loader skips the document and keeps going.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract the full text of the document at `location`
    async fn extract(&self, location: &Path) -> Result<String>;
}

/// Extracts text from files on disk by extension
///
/// PDFs go through `pdf-extract`; text and markdown are read as UTF-8
/// (invalid sequences are replaced).
#[derive(Debug, Clone, Copy, Default)]
pub struct FileExtractor;

impl FileExtractor {
    /// Extract text from in-memory file contents of the given type
    pub fn extract_bytes(source_id: &str, file_type: FileType, data: &[u8]) -> Result<String> {
        match file_type {
            FileType::Pdf => pdf_extract::extract_text_from_mem(data)
                .map_err(|e| Error::extraction(source_id, e.to_string())),
            FileType::Txt | FileType::Markdown => Ok(String::from_utf8_lossy(data).into_owned()),
            FileType::Unknown => Err(Error::extraction(source_id, "unsupported file type")),
        }
    }
}

#[async_trait]
impl TextExtractor for FileExtractor {
    async fn extract(&self, location: &Path) -> Result<String> {
        let source_id = location.display().to_string();
        let file_type = FileType::from_path(location);

        if !file_type.is_supported() {
            return Err(Error::extraction(source_id, "unsupported file type"));
        }

        let data = tokio::fs::read(location)
            .await
            .map_err(|e| Error::extraction(&source_id, e.to_string()))?;

        // pdf-extract is CPU-bound and can panic on malformed input
        let id = source_id.clone();
        run_isolated(source_id, move || Self::extract_bytes(&id, file_type, &data)).await
    }
}

/// Run a blocking extraction, turning a panic into `ExtractionFailure`
///
/// Relies on the release profile unwinding (`panic = "unwind"`).
async fn run_isolated<F>(source_id: String, extract: F) -> Result<String>
where
    F: FnOnce() -> Result<String> + Send + 'static,
{
    tokio::task::spawn_blocking(extract).await.map_err(|e| {
        Error::extraction(source_id, format!("extraction task failed: {}", e))
    })?
}
