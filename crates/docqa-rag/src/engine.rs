//! RAG engine implementation

use async_trait::async_trait;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;

use docqa_core::{
    RAGEngine, RAGQuery, RAGResult,
    VectorStore, VectorDocument, SearchConfig,
    Embedder, Error, Result,
};

use crate::config::RagConfig;
use crate::vector_store::LocalVectorStore;

/// Retrieval over the persisted local index
///
/// The index is read from disk on first use and kept for the life of the
/// engine; it is never modified while serving.
pub struct LocalRAGEngine<E: Embedder> {
    embedder: Arc<E>,
    index_dir: PathBuf,
    top_k: usize,
    store: OnceCell<LocalVectorStore>,
}

impl<E: Embedder> LocalRAGEngine<E> {
    /// Create a new local RAG engine
    pub fn new(embedder: Arc<E>, rag_config: &RagConfig) -> Self {
        Self {
            embedder,
            index_dir: rag_config.index_dir.clone(),
            top_k: rag_config.top_k,
            store: OnceCell::new(),
        }
    }

    pub fn index_dir(&self) -> &Path {
        &self.index_dir
    }

    /// The loaded index, reading it from disk the first time
    async fn store(&self) -> Result<&LocalVectorStore> {
        self.store
            .get_or_try_init(|| async {
                let store = LocalVectorStore::load(&self.index_dir).await?;
                tracing::info!(
                    chunks = store.len(),
                    "Vector store loaded from {}",
                    self.index_dir.display()
                );
                Ok::<_, Error>(store)
            })
            .await
    }
}

#[async_trait]
impl<E: Embedder + 'static> RAGEngine for LocalRAGEngine<E> {
    async fn retrieve(&self, query: &RAGQuery) -> Result<RAGResult> {
        if query.query.trim().is_empty() {
            return Err(Error::InvalidInput("query is empty".to_string()));
        }

        // Load before embedding so a missing index fails without a network call.
        let store = self.store().await?;
        let vector = self.embedder.embed_query(&query.query).await?;

        let search_config = SearchConfig {
            top_k: query.top_k,
            score_threshold: query.score_threshold,
        };
        let search_result = store.search_by_vector(&vector, &search_config).await?;

        tracing::debug!(found = search_result.total, "Found relevant chunks");
        if let Some(first) = search_result.documents.first() {
            tracing::debug!(score = first.score, "Top chunk: {}", first.content);
        }

        let context = self.build_context(&search_result.documents);

        Ok(RAGResult {
            documents: search_result.documents,
            context,
            metadata: Some(json!({
                "query": query.query,
                "top_k": query.top_k,
                "results_count": search_result.total,
            })),
        })
    }

    fn build_context(&self, documents: &[VectorDocument]) -> String {
        documents
            .iter()
            .map(|doc| doc.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn default_top_k(&self) -> usize {
        self.top_k
    }

    async fn stats(&self) -> Result<serde_json::Value> {
        let loaded = self.store.get();
        let count = match loaded {
            Some(store) => Some(store.count().await?),
            None => None,
        };

        Ok(json!({
            "index_dir": self.index_dir.display().to_string(),
            "loaded": loaded.is_some(),
            "vector_store_count": count,
            "top_k": self.top_k,
            "embedding_model": self.embedder.model_id(),
        }))
    }

    fn is_ready(&self) -> bool {
        self.store.initialized() || LocalVectorStore::exists(&self.index_dir)
    }
}
