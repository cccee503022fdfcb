//! Error types for DocQA

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the DocQA system
#[derive(Error, Debug)]
pub enum Error {
    #[error("LLM provider error: {0}")]
    LLMProvider(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("RAG engine error: {0}")]
    RAGEngine(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error(
        "Vector index not found at {}. Initialize it first by starting the service with documents in the configured directory (or run with --rebuild).",
        .0.display()
    )]
    IndexNotFound(PathBuf),

    #[error("Failed to load document {}: {message}", .path.display())]
    DocumentLoader { path: PathBuf, message: String },

    #[error("Document indexer error: {0}")]
    DocumentIndexer(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl Error {
    /// Build a loader error for a specific file
    pub fn loader(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Error::DocumentLoader {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_not_found_is_actionable() {
        let err = Error::IndexNotFound(PathBuf::from("vector_index"));
        let message = err.to_string();
        assert!(message.contains("vector_index"));
        assert!(message.contains("Initialize it first"));
    }

    #[test]
    fn test_loader_error_names_file() {
        let err = Error::loader("datasets/broken.pdf", "unexpected end of stream");
        assert_eq!(
            err.to_string(),
            "Failed to load document datasets/broken.pdf: unexpected end of stream"
        );
    }
}
