//! Knowledge store and similarity-ranked retrieval

mod search;
mod store;

pub use search::Retriever;
pub use store::{KnowledgeStore, ScoredChunk, VectorIndex};
