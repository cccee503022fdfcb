//! Core traits and types for DocQA
//!
//! This crate defines the fundamental traits and types used across the DocQA system.
//! It provides capability-facing interfaces for LLM providers, embedding services,
//! vector stores, document indexers, and RAG engines, making the system test-friendly.

pub mod llm;
pub mod embedding;
pub mod rag;
pub mod vector_store;
pub mod document_indexer;
pub mod error;


pub use error::{Error, Result};
pub use llm::{LLMProvider, GenerationConfig, GenerationResult};
pub use embedding::Embedder;
pub use rag::{RAGEngine, RAGQuery, RAGResult};
pub use vector_store::{VectorStore, VectorDocument, SearchResult, SearchConfig};
pub use document_indexer::{
    DocumentIndexer, Document, IndexingResult, IndexingConfig, InitOutcome,
};
