//! Startup loading of the knowledge base

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

use crate::embeddings::EmbeddingProvider;
use crate::error::{Error, Result};
use crate::retrieval::KnowledgeStore;
use crate::types::{ChunkRecord, FileType, SourceDocument};

use super::chunker::TextChunker;
use super::parser::TextExtractor;

/// A document that contributed no records
#[derive(Debug, Clone, Serialize)]
pub struct SkippedDocument {
    /// Document identifier
    pub source: String,
    /// Why it was skipped
    pub reason: String,
}

/// Outcome of a knowledge-base load
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    /// Documents that produced records, in load order
    pub loaded: Vec<SourceDocument>,
    /// Documents skipped because extraction failed or found no text
    pub skipped: Vec<SkippedDocument>,
    /// Total chunk records in the store
    pub record_count: usize,
    /// When loading finished
    pub loaded_at: DateTime<Utc>,
}

/// Builds a [`KnowledgeStore`] from document locations
///
/// Extraction problems only skip the affected document. Embedding failures
/// abort the whole load.
pub struct KnowledgeLoader {
    chunker: TextChunker,
    embedder: Arc<dyn EmbeddingProvider>,
    extractor: Arc<dyn TextExtractor>,
}

impl KnowledgeLoader {
    /// Create a loader
    pub fn new(
        chunker: TextChunker,
        embedder: Arc<dyn EmbeddingProvider>,
        extractor: Arc<dyn TextExtractor>,
    ) -> Self {
        Self {
            chunker,
            embedder,
            extractor,
        }
    }

    /// Load every document into a fresh store
    pub async fn load(&self, documents: &[PathBuf]) -> Result<(KnowledgeStore, LoadReport)> {
        let locations = expand_locations(documents);
        tracing::info!(
            "Loading {} documents with {} (chunk_size={}, overlap={})",
            locations.len(),
            self.embedder.name(),
            self.chunker.chunk_size(),
            self.chunker.overlap()
        );

        let mut store = KnowledgeStore::new(self.embedder.dimensions());
        let mut report = LoadReport::default();

        for location in &locations {
            let source = location.display().to_string();

            let text = match self.extractor.extract(location).await {
                Ok(text) if text.trim().is_empty() => {
                    tracing::warn!("Skipping {}: no extractable text", source);
                    report.skipped.push(SkippedDocument {
                        source,
                        reason: "no extractable text".to_string(),
                    });
                    continue;
                }
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", source, e);
                    report.skipped.push(SkippedDocument {
                        source,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let document = self.load_document(&mut store, location, source, &text).await?;
            tracing::debug!(
                "Loaded {} ({} chunks, {} chars)",
                document.source,
                document.chunk_count,
                document.char_count
            );
            report.loaded.push(document);
        }

        report.record_count = store.len();
        report.loaded_at = Utc::now();
        tracing::info!(
            "Knowledge base loaded: {} chunk records from {} documents ({} skipped)",
            report.record_count,
            report.loaded.len(),
            report.skipped.len()
        );

        Ok((store, report))
    }

    /// Chunk, embed and append one document's text
    async fn load_document(
        &self,
        store: &mut KnowledgeStore,
        location: &Path,
        source: String,
        text: &str,
    ) -> Result<SourceDocument> {
        let chunks = self.chunker.chunk(text);
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        if embeddings.len() != chunks.len() {
            return Err(Error::model_unavailable(format!(
                "Expected {} embeddings for {}, got {}",
                chunks.len(),
                source,
                embeddings.len()
            )));
        }

        let records: Vec<ChunkRecord> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| {
                ChunkRecord::new(
                    source.as_str(),
                    chunk.index,
                    chunk.text,
                    embedding,
                    chunk.char_start,
                    chunk.char_end,
                )
            })
            .collect();

        let document = SourceDocument {
            file_type: FileType::from_path(location),
            chunk_count: records.len(),
            char_count: text.chars().count(),
            content_hash: hex::encode(Sha256::digest(text.as_bytes())),
            source,
        };

        store.insert_document(document.clone(), records)?;
        Ok(document)
    }
}

/// Expand directories into the supported files beneath them
///
/// Files are kept as given (a missing file is reported later as a skipped
/// document). Directories are walked recursively in sorted order.
pub fn expand_locations(locations: &[PathBuf]) -> Vec<PathBuf> {
    let mut expanded = Vec::new();

    for location in locations {
        if !location.is_dir() {
            expanded.push(location.clone());
            continue;
        }

        for entry in WalkDir::new(location).sort_by_file_name() {
            match entry {
                Ok(entry) if entry.file_type().is_file() => {
                    if FileType::from_path(entry.path()).is_supported() {
                        expanded.push(entry.into_path());
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("Cannot read {}: {}", location.display(), e),
            }
        }
    }

    expanded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::Embedding;
    use crate::ingestion::FileExtractor;
    use crate::retrieval::VectorIndex;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Embeds a text as `[char count, 1.0]`
    #[derive(Default)]
    struct LengthEmbedder {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl EmbeddingProvider for LengthEmbedder {
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::model_unavailable("connection refused"));
            }
            Ok(texts
                .iter()
                .map(|t| Embedding::new(vec![t.chars().count() as f32, 1.0]))
                .collect())
        }

        fn dimensions(&self) -> usize {
            2
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "length"
        }
    }

    /// Serves fixed texts; unknown locations fail extraction
    struct MapExtractor(HashMap<PathBuf, String>);

    impl MapExtractor {
        fn new(entries: &[(&str, String)]) -> Self {
            Self(
                entries
                    .iter()
                    .map(|(k, v)| (PathBuf::from(k), v.clone()))
                    .collect(),
            )
        }
    }

    #[async_trait]
    impl TextExtractor for MapExtractor {
        async fn extract(&self, location: &Path) -> Result<String> {
            self.0
                .get(location)
                .cloned()
                .ok_or_else(|| Error::extraction(location.display().to_string(), "not found"))
        }
    }

    fn loader(embedder: Arc<LengthEmbedder>, extractor: MapExtractor) -> KnowledgeLoader {
        KnowledgeLoader::new(
            TextChunker::new(500, 100).unwrap(),
            embedder,
            Arc::new(extractor),
        )
    }

    #[tokio::test]
    async fn test_thousand_char_document_yields_three_records() {
        let text: String = ('a'..='z').cycle().take(1000).collect();
        let embedder = Arc::new(LengthEmbedder::default());
        let loader = loader(embedder.clone(), MapExtractor::new(&[("kb/doc.txt", text.clone())]));

        let (store, report) = loader.load(&[PathBuf::from("kb/doc.txt")]).await.unwrap();

        assert_eq!(store.len(), 3);
        assert_eq!(report.record_count, 3);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);

        let records = store.records();
        let spans: Vec<(usize, usize)> =
            records.iter().map(|r| (r.char_start, r.char_end)).collect();
        assert_eq!(spans, vec![(0, 500), (400, 900), (800, 1000)]);
        assert_eq!(records[0].text.as_str(), &text[0..500]);
        assert_eq!(records[1].text.as_str(), &text[400..900]);
        assert_eq!(records[2].text.as_str(), &text[800..1000]);
        assert!(records.iter().enumerate().all(|(i, r)| r.chunk_index == i as u32));
        assert!(records.iter().all(|r| r.source == "kb/doc.txt"));

        let doc = &report.loaded[0];
        assert_eq!(doc.chunk_count, 3);
        assert_eq!(doc.char_count, 1000);
        assert_eq!(doc.content_hash.len(), 64);
    }

    #[tokio::test]
    async fn test_failed_and_empty_documents_are_skipped() {
        let embedder = Arc::new(LengthEmbedder::default());
        let loader = loader(
            embedder,
            MapExtractor::new(&[
                ("kb/good.txt", "Shipping takes three days.".to_string()),
                ("kb/blank.txt", "  \n ".to_string()),
            ]),
        );

        let docs = [
            PathBuf::from("kb/missing.pdf"),
            PathBuf::from("kb/good.txt"),
            PathBuf::from("kb/blank.txt"),
        ];
        let (store, report) = loader.load(&docs).await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(report.loaded.len(), 1);
        assert_eq!(report.loaded[0].source, "kb/good.txt");
        let skipped: Vec<&str> = report.skipped.iter().map(|s| s.source.as_str()).collect();
        assert_eq!(skipped, vec!["kb/missing.pdf", "kb/blank.txt"]);
        assert!(report.skipped[0].reason.contains("not found"));
    }

    #[tokio::test]
    async fn test_no_documents_gives_empty_store() {
        let loader = loader(Arc::new(LengthEmbedder::default()), MapExtractor::new(&[]));
        let (store, report) = loader.load(&[]).await.unwrap();
        assert!(VectorIndex::is_empty(&store));
        assert_eq!(store.dimensions(), 2);
        assert_eq!(report.record_count, 0);
    }

    #[tokio::test]
    async fn test_embedding_failure_is_fatal() {
        let embedder = Arc::new(LengthEmbedder {
            fail: true,
            ..Default::default()
        });
        let loader = loader(embedder, MapExtractor::new(&[("kb/a.txt", "text".to_string())]));

        let err = loader.load(&[PathBuf::from("kb/a.txt")]).await.unwrap_err();
        assert!(matches!(err, Error::ModelUnavailable(_)));
    }

    #[tokio::test]
    async fn test_loads_directory_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("b.txt"), "second file").unwrap();
        std::fs::write(dir.path().join("a.md"), "# first file").unwrap();
        std::fs::write(dir.path().join("sub").join("c.txt"), "third file").unwrap();
        std::fs::write(dir.path().join("ignored.bin"), [0u8, 1, 2]).unwrap();

        let expanded = expand_locations(&[dir.path().to_path_buf()]);
        let names: Vec<_> = expanded
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("a.md"),
                PathBuf::from("b.txt"),
                PathBuf::from("sub").join("c.txt"),
            ]
        );

        let loader = KnowledgeLoader::new(
            TextChunker::new(500, 100).unwrap(),
            Arc::new(LengthEmbedder::default()),
            Arc::new(FileExtractor),
        );
        let (store, report) = loader.load(&[dir.path().to_path_buf()]).await.unwrap();

        assert_eq!(store.len(), 3);
        assert_eq!(store.records()[0].text, "# first file");
        assert!(report.skipped.is_empty());
        assert_eq!(store.documents()[1].file_type, FileType::Txt);
    }
}
