//! Persisted local vector store

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::cmp::Ordering;
use std::path::Path;

use docqa_core::{
    VectorStore, VectorDocument, SearchResult, SearchConfig,
    Error, Result,
};

/// File holding the serialized chunks and embeddings inside the index directory
pub const INDEX_FILE: &str = "index.json";

#[derive(Debug, Serialize, Deserialize)]
struct VectorStoreData {
    embedding_dimension: usize,
    documents: Vec<VectorDocument>,
}

/// Flat cosine-similarity index over chunk embeddings, saved as JSON
#[derive(Debug, Clone)]
pub struct LocalVectorStore {
    documents: Vec<VectorDocument>,
    embedding_dimension: usize,
}

impl LocalVectorStore {
    /// Pair chunk texts with their embeddings, in order
    pub fn from_embeddings(chunks: Vec<String>, embeddings: Vec<Vec<f32>>) -> Result<Self> {
        if chunks.len() != embeddings.len() {
            return Err(Error::VectorStore(format!(
                "{} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }

        let embedding_dimension = embeddings.first().map(Vec::len).unwrap_or(0);
        if let Some(bad) = embeddings.iter().position(|e| e.len() != embedding_dimension) {
            return Err(Error::VectorStore(format!(
                "embedding {} has dimension {}, expected {}",
                bad,
                embeddings[bad].len(),
                embedding_dimension
            )));
        }

        let documents = chunks
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(i, (content, embedding))| VectorDocument {
                id: format!("chunk-{}", i),
                content,
                embedding: Some(embedding),
                metadata: json!({ "chunk_index": i }),
                score: None,
            })
            .collect();

        Ok(Self {
            documents,
            embedding_dimension,
        })
    }

    /// Whether a saved index exists in `dir`
    pub fn exists(dir: &Path) -> bool {
        dir.join(INDEX_FILE).is_file()
    }

    /// Load a saved index from `dir`
    pub async fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(INDEX_FILE);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::IndexNotFound(dir.to_path_buf()));
            }
            Err(e) => return Err(Error::Io(e)),
        };

        let data: VectorStoreData = serde_json::from_str(&content)
            .map_err(|e| Error::Serialization(format!("{}: {}", path.display(), e)))?;

        tracing::debug!(
            chunks = data.documents.len(),
            dimension = data.embedding_dimension,
            "Loaded vector index from {}",
            dir.display()
        );

        Ok(Self {
            documents: data.documents,
            embedding_dimension: data.embedding_dimension,
        })
    }

    /// Save the index into `dir`, creating it if needed
    pub async fn save(&self, dir: &Path) -> Result<()> {
        tokio::fs::create_dir_all(dir).await?;

        let store_data = VectorStoreData {
            embedding_dimension: self.embedding_dimension,
            documents: self.documents.clone(),
        };
        let content = serde_json::to_string(&store_data)
            .map_err(|e| Error::Serialization(e.to_string()))?;

        tokio::fs::write(dir.join(INDEX_FILE), content).await?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Simple cosine similarity calculation
    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() {
            return 0.0;
        }

        let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        dot_product / (norm_a * norm_b)
    }
}

#[async_trait]
impl VectorStore for LocalVectorStore {
    async fn search_by_vector(&self, vector: &[f32], config: &SearchConfig) -> Result<SearchResult> {
        if !self.documents.is_empty() && vector.len() != self.embedding_dimension {
            return Err(Error::VectorStore(format!(
                "query embedding has dimension {}, index expects {}",
                vector.len(),
                self.embedding_dimension
            )));
        }

        let mut results: Vec<VectorDocument> = self
            .documents
            .iter()
            .filter_map(|doc| {
                let embedding = doc.embedding.as_ref()?;
                let score = Self::cosine_similarity(vector, embedding);
                if config.score_threshold.is_some_and(|threshold| score < threshold) {
                    return None;
                }
                Some(VectorDocument {
                    id: doc.id.clone(),
                    content: doc.content.clone(),
                    embedding: None,
                    metadata: doc.metadata.clone(),
                    score: Some(score),
                })
            })
            .collect();

        // Stable sort keeps index order among equal scores.
        results.sort_by(|a, b| {
            b.score
                .unwrap_or(0.0)
                .partial_cmp(&a.score.unwrap_or(0.0))
                .unwrap_or(Ordering::Equal)
        });
        results.truncate(config.top_k);

        let total = results.len();

        Ok(SearchResult {
            documents: results,
            total,
        })
    }

    async fn get(&self, id: &str) -> Result<Option<VectorDocument>> {
        Ok(self.documents.iter().find(|doc| doc.id == id).cloned())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.documents.len())
    }

    fn dimension(&self) -> Option<usize> {
        (!self.documents.is_empty()).then_some(self.embedding_dimension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_store() -> LocalVectorStore {
        LocalVectorStore::from_embeddings(
            vec!["alpha".to_string(), "beta".to_string(), "gamma".to_string()],
            vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.7, 0.7]],
        )
        .unwrap()
    }

    #[test]
    fn test_cosine_similarity() {
        let vec1 = vec![1.0, 0.0, 0.0];
        let vec2 = vec![1.0, 0.0, 0.0];
        let vec3 = vec![0.0, 1.0, 0.0];

        assert!((LocalVectorStore::cosine_similarity(&vec1, &vec2) - 1.0).abs() < 0.001);
        assert!((LocalVectorStore::cosine_similarity(&vec1, &vec3) - 0.0).abs() < 0.001);
        assert_eq!(LocalVectorStore::cosine_similarity(&vec1, &[1.0]), 0.0);
        assert_eq!(LocalVectorStore::cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_from_embeddings_validates_shapes() {
        let err = LocalVectorStore::from_embeddings(vec!["a".to_string()], vec![]).unwrap_err();
        assert!(matches!(err, Error::VectorStore(_)));

        let err = LocalVectorStore::from_embeddings(
            vec!["a".to_string(), "b".to_string()],
            vec![vec![1.0, 0.0], vec![1.0]],
        )
        .unwrap_err();
        assert!(err.to_string().contains("dimension"));
    }

    #[tokio::test]
    async fn test_search_orders_by_similarity() {
        let store = sample_store();
        let config = SearchConfig { top_k: 2, score_threshold: None };

        let results = store.search_by_vector(&[0.0, 1.0], &config).await.unwrap();
        let contents: Vec<_> = results.documents.iter().map(|d| d.content.as_str()).collect();
        assert_eq!(contents, vec!["beta", "gamma"]);
        assert_eq!(results.total, 2);
        assert!(results.documents.iter().all(|d| d.embedding.is_none()));
    }

    #[tokio::test]
    async fn test_search_threshold_and_dimension() {
        let store = sample_store();
        let config = SearchConfig { top_k: 10, score_threshold: Some(0.9) };

        let results = store.search_by_vector(&[1.0, 0.0], &config).await.unwrap();
        assert_eq!(results.documents.len(), 1);
        assert_eq!(results.documents[0].content, "alpha");

        let err = store.search_by_vector(&[1.0, 0.0, 0.0], &config).await.unwrap_err();
        assert!(matches!(err, Error::VectorStore(_)));
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let index_dir = dir.path().join("vector_index");
        assert!(!LocalVectorStore::exists(&index_dir));

        sample_store().save(&index_dir).await.unwrap();
        assert!(LocalVectorStore::exists(&index_dir));

        let loaded = LocalVectorStore::load(&index_dir).await.unwrap();
        assert_eq!(loaded.count().await.unwrap(), 3);
        assert_eq!(loaded.dimension(), Some(2));
        let beta = loaded.get("chunk-1").await.unwrap().unwrap();
        assert_eq!(beta.content, "beta");
    }

    #[tokio::test]
    async fn test_load_missing_index() {
        let dir = TempDir::new().unwrap();
        let err = LocalVectorStore::load(&dir.path().join("nope")).await.unwrap_err();
        assert!(matches!(err, Error::IndexNotFound(_)));
    }
}
