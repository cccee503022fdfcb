//! Document indexer trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// A document whose text has been extracted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub content: String,
    pub source: String,
    pub metadata: serde_json::Value,
}

/// Result of an indexing operation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexingResult {
    pub documents_indexed: usize,
    pub documents_failed: usize,
    pub chunks_indexed: usize,
    pub errors: Vec<String>,
}

/// Configuration for document indexing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub batch_size: usize,
    pub embed_concurrency: usize,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 100,
            batch_size: 32,
            embed_concurrency: 2,
        }
    }
}

/// What a call to [`DocumentIndexer::initialize`] ended up doing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum InitOutcome {
    /// A new index was built and persisted
    Built(IndexingResult),
    /// An index already existed, so nothing was done
    AlreadyPresent { stale: bool },
}

impl InitOutcome {
    pub fn did_work(&self) -> bool {
        matches!(self, InitOutcome::Built(_))
    }
}

/// Trait for document indexers
///
/// An indexer turns a directory of documents into a persisted vector index.
/// Building is gated on presence: if an index already exists it is left alone.
#[async_trait]
pub trait DocumentIndexer: Send + Sync {
    /// Build the index unless one is already present
    async fn initialize(&self) -> Result<InitOutcome>;

    /// Discard any existing index and build a fresh one
    async fn rebuild(&self) -> Result<IndexingResult>;

    /// Index already-loaded documents and persist the result
    async fn index_documents(&self, documents: Vec<Document>) -> Result<IndexingResult>;

    /// Whether a persisted index exists
    fn index_exists(&self) -> bool;

    /// Get indexing statistics
    async fn stats(&self) -> Result<serde_json::Value>;
}
