//! Vector store trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// A chunk stored in the vector store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorDocument {
    pub id: String,
    pub content: String,
    pub embedding: Option<Vec<f32>>,
    pub metadata: serde_json::Value,
    pub score: Option<f32>,
}

/// Search result from vector store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub documents: Vec<VectorDocument>,
    pub total: usize,
}

/// Configuration for vector search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub top_k: usize,
    pub score_threshold: Option<f32>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            score_threshold: None,
        }
    }
}

/// Trait for read-only similarity search over stored chunks
///
/// A store is built once and persisted; after that it is never mutated, so
/// the trait exposes lookups only.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Search using a vector embedding
    async fn search_by_vector(&self, vector: &[f32], config: &SearchConfig) -> Result<SearchResult>;

    /// Get a document by ID
    async fn get(&self, id: &str) -> Result<Option<VectorDocument>>;

    /// Get the total number of documents
    async fn count(&self) -> Result<usize>;

    /// Dimension of the stored embeddings, if any are stored
    fn dimension(&self) -> Option<usize>;
}
