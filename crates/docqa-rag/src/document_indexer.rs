//! Building and persisting the vector index

use async_trait::async_trait;
use chrono::Utc;
use futures::{StreamExt, TryStreamExt};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use docqa_core::{
    DocumentIndexer, Document, IndexingResult, IndexingConfig, InitOutcome,
    Embedder, Error, Result,
};

use crate::chunker::TextChunker;
use crate::config::RagConfig;
use crate::loader::{self, DocumentLoader, UnreadablePolicy};
use crate::manifest::{IndexManifest, SourceFingerprint};
use crate::vector_store::LocalVectorStore;

/// Builds the vector index from the documents directory, once
pub struct IndexBuilder<E: Embedder> {
    embedder: Arc<E>,
    loader: DocumentLoader,
    docs_dir: PathBuf,
    index_dir: PathBuf,
    config: IndexingConfig,
    rebuild_on_stale: bool,
}

impl<E: Embedder> IndexBuilder<E> {
    /// Create a new index builder
    pub fn new(embedder: Arc<E>, rag_config: &RagConfig) -> Self {
        Self {
            embedder,
            loader: DocumentLoader::new(rag_config.unreadable),
            docs_dir: rag_config.docs_dir.clone(),
            index_dir: rag_config.index_dir.clone(),
            config: rag_config.indexing.clone(),
            rebuild_on_stale: rag_config.rebuild_on_stale,
        }
    }

    pub fn index_dir(&self) -> &Path {
        &self.index_dir
    }

    /// Compare the current documents directory and build settings with the
    /// manifest. Returns true when the index no longer matches them.
    pub async fn check_staleness(&self) -> Result<bool> {
        let Some(manifest) = IndexManifest::load(&self.index_dir).await? else {
            tracing::warn!(
                "No manifest in {}; cannot tell whether the index is stale",
                self.index_dir.display()
            );
            return Ok(false);
        };

        let files = self.loader.discover(&self.docs_dir).await?;
        let current = fingerprint_files(&files, self.loader.policy()).await?;

        let mut changes = manifest.settings_changes(
            self.embedder.model_id(),
            self.config.chunk_size,
            self.config.chunk_overlap,
        );
        changes.extend(manifest.changes_since(&current));

        if changes.is_empty() {
            return Ok(false);
        }

        tracing::warn!(
            "⚠️ Documents or settings changed since the index was built ({}): {}",
            manifest.created_at.to_rfc3339(),
            changes.join(", ")
        );
        Ok(true)
    }

    /// Load, chunk, embed and persist everything in the documents directory
    async fn build(&self) -> Result<IndexingResult> {
        let files = self.loader.discover(&self.docs_dir).await?;
        let sources = fingerprint_files(&files, self.loader.policy()).await?;
        let loaded = self.loader.load_directory(&self.docs_dir).await?;

        let mut result = self.build_index(&loaded.documents, sources).await?;
        result.documents_failed = loaded.failures.len();
        result.errors = loaded.failures;
        Ok(result)
    }

    async fn build_index(
        &self,
        documents: &[Document],
        sources: Vec<SourceFingerprint>,
    ) -> Result<IndexingResult> {
        let chunker = TextChunker::from_config(&self.config)?;
        let all_text = loader::concatenate(documents);
        let chunks = chunker.split(&all_text);

        tracing::info!(
            documents = documents.len(),
            chunks = chunks.len(),
            "Split documents into chunks"
        );

        if chunks.is_empty() {
            return Err(Error::DocumentIndexer(format!(
                "no text extracted from documents in {}; nothing to index",
                self.docs_dir.display()
            )));
        }

        let embeddings = self.embed_chunks(&chunks).await?;
        let chunk_count = chunks.len();
        let store = LocalVectorStore::from_embeddings(chunks, embeddings)?;

        let manifest = IndexManifest {
            created_at: Utc::now(),
            embedding_model: self.embedder.model_id().to_string(),
            chunk_size: self.config.chunk_size,
            chunk_overlap: self.config.chunk_overlap,
            chunk_count,
            sources,
        };
        self.persist(&store, &manifest).await?;

        tracing::info!("✅ Vector index created at {}", self.index_dir.display());

        Ok(IndexingResult {
            documents_indexed: documents.len(),
            documents_failed: 0,
            chunks_indexed: chunk_count,
            errors: Vec::new(),
        })
    }

    /// Embed chunks in batches, keeping input order. Any failure aborts.
    async fn embed_chunks(&self, chunks: &[String]) -> Result<Vec<Vec<f32>>> {
        let batch_size = self.config.batch_size.max(1);
        let concurrency = self.config.embed_concurrency.max(1);

        let batches: Vec<Vec<String>> = chunks.chunks(batch_size).map(<[String]>::to_vec).collect();

        let embedded: Vec<Vec<Vec<f32>>> = futures::stream::iter(batches)
            .map(|batch| {
                let embedder = Arc::clone(&self.embedder);
                async move {
                    let vectors = embedder.embed_documents(&batch).await?;
                    if vectors.len() != batch.len() {
                        return Err(Error::Embedding(format!(
                            "embedding service returned {} vectors for {} chunks",
                            vectors.len(),
                            batch.len()
                        )));
                    }
                    tracing::debug!(batch = batch.len(), "Embedded batch");
                    Ok(vectors)
                }
            })
            .buffered(concurrency)
            .try_collect()
            .await?;

        Ok(embedded.into_iter().flatten().collect())
    }

    /// Write into a sibling directory, then swap it into place so a failed
    /// build never leaves a half-written index behind.
    async fn persist(&self, store: &LocalVectorStore, manifest: &IndexManifest) -> Result<()> {
        let staging = sibling_dir(&self.index_dir, ".building");
        if staging.exists() {
            tokio::fs::remove_dir_all(&staging).await?;
        }

        store.save(&staging).await?;
        manifest.save(&staging).await?;

        swap_into_place(&staging, &self.index_dir).await
    }
}

#[async_trait]
impl<E: Embedder + 'static> DocumentIndexer for IndexBuilder<E> {
    async fn initialize(&self) -> Result<InitOutcome> {
        if self.index_exists() {
            let stale = match self.check_staleness().await {
                Ok(stale) => stale,
                Err(e) => {
                    tracing::warn!("Could not check whether the vector index is stale: {}", e);
                    false
                }
            };
            if stale && self.rebuild_on_stale {
                tracing::info!("Rebuilding stale vector index");
                return self.rebuild().await.map(InitOutcome::Built);
            }
            tracing::info!(
                "Vector index already present at {}; skipping build",
                self.index_dir.display()
            );
            return Ok(InitOutcome::AlreadyPresent { stale });
        }

        tracing::info!(
            "Creating vector index from the documents in {}...",
            self.docs_dir.display()
        );
        self.build().await.map(InitOutcome::Built)
    }

    async fn rebuild(&self) -> Result<IndexingResult> {
        self.build().await
    }

    async fn index_documents(&self, documents: Vec<Document>) -> Result<IndexingResult> {
        let mut sources = Vec::new();
        for document in &documents {
            let path = Path::new(&document.source);
            if path.is_file() {
                sources.push(SourceFingerprint::of_file(path).await?);
            }
        }
        self.build_index(&documents, sources).await
    }

    fn index_exists(&self) -> bool {
        LocalVectorStore::exists(&self.index_dir)
    }

    async fn stats(&self) -> Result<serde_json::Value> {
        let manifest = if self.index_exists() {
            IndexManifest::load(&self.index_dir).await?
        } else {
            None
        };

        Ok(json!({
            "index_present": self.index_exists(),
            "index_dir": self.index_dir.display().to_string(),
            "docs_dir": self.docs_dir.display().to_string(),
            "chunk_size": self.config.chunk_size,
            "chunk_overlap": self.config.chunk_overlap,
            "chunk_count": manifest.as_ref().map(|m| m.chunk_count),
            "created_at": manifest.as_ref().map(|m| m.created_at.to_rfc3339()),
        }))
    }
}

/// Under `Skip` an unreadable file is left out; the loader records the failure.
async fn fingerprint_files(
    files: &[PathBuf],
    policy: UnreadablePolicy,
) -> Result<Vec<SourceFingerprint>> {
    let mut fingerprints = Vec::with_capacity(files.len());
    for file in files {
        match SourceFingerprint::of_file(file).await {
            Ok(fingerprint) => fingerprints.push(fingerprint),
            Err(e) if policy == UnreadablePolicy::Skip => {
                tracing::debug!("Cannot fingerprint {}: {}", file.display(), e);
            }
            Err(e) => return Err(Error::loader(file, e)),
        }
    }
    Ok(fingerprints)
}

/// Replace `target` with `staging`. The previous index is moved aside first
/// and only deleted once the new one is in place.
async fn swap_into_place(staging: &Path, target: &Path) -> Result<()> {
    let previous = sibling_dir(target, ".previous");
    if previous.exists() {
        tokio::fs::remove_dir_all(&previous).await?;
    }

    let had_index = target.exists();
    if had_index {
        tokio::fs::rename(target, &previous).await?;
    }

    if let Err(e) = tokio::fs::rename(staging, target).await {
        if had_index {
            if let Err(restore) = tokio::fs::rename(&previous, target).await {
                tracing::error!(
                    "Could not restore the previous index from {}: {}",
                    previous.display(),
                    restore
                );
            }
        }
        return Err(e.into());
    }

    if had_index {
        tokio::fs::remove_dir_all(&previous).await?;
    }
    Ok(())
}

fn sibling_dir(index_dir: &Path, suffix: &str) -> PathBuf {
    let mut name = index_dir
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "index".into());
    name.push(suffix);
    index_dir.with_file_name(name)
}
