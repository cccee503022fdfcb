//! Embedding provider trait

use async_trait::async_trait;

use crate::Result;

/// Trait for services that turn text into embedding vectors
///
/// Vectors are opaque to the rest of the system: they are only stored and
/// compared. Documents and queries are embedded separately because hosted
/// services tune vectors differently for each side of a retrieval.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of document chunks, preserving input order
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single search query
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>>;

    /// Get the embedding model ID being used
    fn model_id(&self) -> &str;
}
