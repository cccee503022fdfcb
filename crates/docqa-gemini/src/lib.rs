//! Google Gemini integration for DocQA
//!
//! This crate provides the Gemini implementation of the `LLMProvider` and
//! `Embedder` traits over the public REST API.

mod client;
mod config;

#[cfg(test)]
mod tests;

pub use client::GeminiClient;
pub use config::{GeminiConfig, DEFAULT_API_URL, DEFAULT_CHAT_MODEL, DEFAULT_EMBEDDING_MODEL};

// Re-export core types for convenience
pub use docqa_core::{
    Embedder, LLMProvider, GenerationConfig, GenerationResult, Error, Result,
};
