//! Document retrieval pipeline for DocQA
//!
//! This crate provides the document loader, chunker, persisted vector store,
//! index builder and the RAG engine that queries the built index.

mod config;
mod loader;
mod chunker;
mod vector_store;
mod manifest;
mod document_indexer;
mod engine;


pub use config::{RagConfig, DEFAULT_DOCS_DIR, DEFAULT_INDEX_DIR};
pub use loader::{DocumentLoader, LoadedDocuments, UnreadablePolicy, SUPPORTED_EXTENSIONS, concatenate};
pub use chunker::TextChunker;
pub use vector_store::{LocalVectorStore, INDEX_FILE};
pub use manifest::{IndexManifest, SourceFingerprint, MANIFEST_FILE};
pub use document_indexer::IndexBuilder;
pub use engine::LocalRAGEngine;

// Re-export core types for convenience
pub use docqa_core::{
    RAGEngine, RAGQuery, RAGResult,
    VectorStore, VectorDocument, SearchResult, SearchConfig,
    DocumentIndexer, Document, IndexingResult, IndexingConfig, InitOutcome,
    Embedder, Error, Result,
};
