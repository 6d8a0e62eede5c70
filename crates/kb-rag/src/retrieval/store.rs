//! In-memory knowledge store with brute-force cosine search

use std::cmp::Ordering;

use crate::embeddings::Embedding;
use crate::error::{Error, Result};
use crate::types::{ChunkRecord, SourceDocument};

/// A stored record together with its similarity to a query
#[derive(Debug, Clone, Copy)]
pub struct ScoredChunk<'a> {
    /// The matching record
    pub record: &'a ChunkRecord,
    /// Cosine similarity to the query (0.0 for zero-magnitude vectors)
    pub score: f32,
}

/// Nearest-neighbour search over stored chunk embeddings
///
/// `KnowledgeStore` implements this with a linear scan; an approximate index
/// can be swapped in behind the same trait.
pub trait VectorIndex: Send + Sync {
    /// Up to `top_k` records, best first; equal scores keep insertion order
    fn search(&self, query: &Embedding, top_k: usize) -> Vec<ScoredChunk<'_>>;

    /// Number of indexed records
    fn len(&self) -> usize;

    /// Whether the index is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Ordered collection of chunk records
///
/// Filled once during startup, then shared read-only. All embeddings have
/// `dimensions` components.
#[derive(Debug, Clone)]
pub struct KnowledgeStore {
    /// Embedding dimensionality every record must match
    dimensions: usize,
    /// Records in insertion order
    records: Vec<ChunkRecord>,
    /// Documents that contributed records
    documents: Vec<SourceDocument>,
}

impl KnowledgeStore {
    /// Create an empty store for `dimensions`-long embeddings
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            records: Vec::new(),
            documents: Vec::new(),
        }
    }

    /// Embedding dimensionality
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Append a record, rejecting embeddings of the wrong length
    pub fn insert(&mut self, record: ChunkRecord) -> Result<()> {
        if record.embedding.dimensions() != self.dimensions {
            return Err(Error::DimensionMismatch {
                expected: self.dimensions,
                actual: record.embedding.dimensions(),
            });
        }
        self.records.push(record);
        Ok(())
    }

    /// Append all chunk records of one document and remember the document
    ///
    /// Either every record is inserted or none is.
    pub fn insert_document(
        &mut self,
        document: SourceDocument,
        records: Vec<ChunkRecord>,
    ) -> Result<()> {
        if let Some(bad) = records
            .iter()
            .find(|r| r.embedding.dimensions() != self.dimensions)
        {
            return Err(Error::DimensionMismatch {
                expected: self.dimensions,
                actual: bad.embedding.dimensions(),
            });
        }
        self.records.extend(records);
        self.documents.push(document);
        Ok(())
    }

    /// Records in insertion order
    pub fn records(&self) -> &[ChunkRecord] {
        &self.records
    }

    /// Documents that contributed records, in load order
    pub fn documents(&self) -> &[SourceDocument] {
        &self.documents
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store has no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl VectorIndex for KnowledgeStore {
    fn search(&self, query: &Embedding, top_k: usize) -> Vec<ScoredChunk<'_>> {
        if top_k == 0 || self.records.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(usize, ScoredChunk<'_>)> = self
            .records
            .iter()
            .enumerate()
            .map(|(position, record)| {
                let score = query.cosine_similarity(&record.embedding);
                (position, ScoredChunk { record, score })
            })
            .collect();

        // Descending by score, then ascending by insertion position.
        scored.sort_by(|(pos_a, a), (pos_b, b)| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then(pos_a.cmp(pos_b))
        });
        scored.truncate(top_k);

        scored.into_iter().map(|(_, chunk)| chunk).collect()
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FileType;

    fn record(source: &str, index: u32, text: &str, values: Vec<f32>) -> ChunkRecord {
        ChunkRecord::new(source, index, text, Embedding::new(values), 0, text.len())
    }

    fn texts<'a>(results: &[ScoredChunk<'a>]) -> Vec<&'a str> {
        results.iter().map(|r| r.record.text.as_str()).collect()
    }

    #[test]
    fn test_ranks_by_cosine_similarity() {
        let mut store = KnowledgeStore::new(2);
        store.insert(record("a", 0, "east", vec![1.0, 0.0])).unwrap();
        store.insert(record("a", 1, "north", vec![0.0, 1.0])).unwrap();
        store.insert(record("a", 2, "north-east", vec![1.0, 1.0])).unwrap();

        let results = store.search(&Embedding::new(vec![0.1, 1.0]), 3);
        assert_eq!(texts(&results), vec!["north", "north-east", "east"]);
        assert!(results[0].score > results[1].score);
    }

    #[test]
    fn test_top_k_truncates() {
        let mut store = KnowledgeStore::new(1);
        for i in 0..5 {
            store.insert(record("a", i, "x", vec![1.0 + i as f32])).unwrap();
        }
        assert_eq!(store.search(&Embedding::new(vec![1.0]), 2).len(), 2);
        assert_eq!(store.search(&Embedding::new(vec![1.0]), 10).len(), 5);
        assert!(store.search(&Embedding::new(vec![1.0]), 0).is_empty());
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut store = KnowledgeStore::new(3);
        let names = ["first", "second", "third", "fourth", "fifth", "sixth"];
        for (i, name) in names.iter().enumerate() {
            store.insert(record("a", i as u32, name, vec![0.5, 0.5, 0.0])).unwrap();
        }

        let results = store.search(&Embedding::new(vec![1.0, 0.2, 0.0]), 6);
        assert_eq!(texts(&results), names.to_vec());
    }

    #[test]
    fn test_zero_vector_never_outranks_positive_match() {
        let mut store = KnowledgeStore::new(2);
        store.insert(record("a", 0, "empty", vec![0.0, 0.0])).unwrap();
        store.insert(record("a", 1, "weak", vec![1.0, 10.0])).unwrap();

        let results = store.search(&Embedding::new(vec![1.0, 0.0]), 2);
        assert_eq!(texts(&results), vec!["weak", "empty"]);
        assert_eq!(results[1].score, 0.0);
    }

    #[test]
    fn test_empty_store_returns_nothing() {
        let store = KnowledgeStore::new(4);
        assert!(store.search(&Embedding::zeros(4), 3).is_empty());
        assert!(VectorIndex::is_empty(&store));
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let mut store = KnowledgeStore::new(3);
        let err = store.insert(record("a", 0, "x", vec![1.0, 2.0])).unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_insert_document_is_all_or_nothing() {
        let mut store = KnowledgeStore::new(2);
        let doc = SourceDocument {
            source: "doc".to_string(),
            file_type: FileType::Txt,
            chunk_count: 2,
            char_count: 10,
            content_hash: String::new(),
        };
        let records = vec![
            record("doc", 0, "ok", vec![1.0, 0.0]),
            record("doc", 1, "bad", vec![1.0]),
        ];

        assert!(store.insert_document(doc, records).is_err());
        assert!(store.is_empty());
        assert!(store.documents().is_empty());
    }
}
