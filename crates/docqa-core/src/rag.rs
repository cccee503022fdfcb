//! RAG (Retrieval-Augmented Generation) engine trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Result, VectorDocument};

/// Query for RAG retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RAGQuery {
    pub query: String,
    pub top_k: usize,
    pub score_threshold: Option<f32>,
}

impl RAGQuery {
    pub fn new(query: impl Into<String>, top_k: usize) -> Self {
        Self {
            query: query.into(),
            top_k,
            score_threshold: None,
        }
    }
}

impl Default for RAGQuery {
    fn default() -> Self {
        Self {
            query: String::new(),
            top_k: 4,
            score_threshold: None,
        }
    }
}

/// Result from RAG retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RAGResult {
    pub documents: Vec<VectorDocument>,
    pub context: String,
    pub metadata: Option<serde_json::Value>,
}

/// Trait for RAG engines
///
/// Retrieval embeds the query and looks up the most similar stored chunks.
#[async_trait]
pub trait RAGEngine: Send + Sync {
    /// Retrieve relevant chunks for a query
    async fn retrieve(&self, query: &RAGQuery) -> Result<RAGResult>;

    /// Build context from retrieved chunks
    fn build_context(&self, documents: &[VectorDocument]) -> String;

    /// Default number of chunks to retrieve
    fn default_top_k(&self) -> usize;

    /// Get statistics about the RAG engine
    async fn stats(&self) -> Result<serde_json::Value>;

    /// Check if the RAG engine has an index to query
    fn is_ready(&self) -> bool;
}
