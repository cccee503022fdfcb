//! Pipeline configuration

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use docqa_core::{Error, IndexingConfig, Result};

use crate::loader::UnreadablePolicy;

pub const DEFAULT_DOCS_DIR: &str = "datasets";
pub const DEFAULT_INDEX_DIR: &str = "vector_index";

/// Where documents and the index live, and how they are processed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    pub docs_dir: PathBuf,
    pub index_dir: PathBuf,
    pub indexing: IndexingConfig,
    pub top_k: usize,
    pub unreadable: UnreadablePolicy,
    pub rebuild_on_stale: bool,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            docs_dir: PathBuf::from(DEFAULT_DOCS_DIR),
            index_dir: PathBuf::from(DEFAULT_INDEX_DIR),
            indexing: IndexingConfig::default(),
            top_k: 4,
            unreadable: UnreadablePolicy::Abort,
            rebuild_on_stale: false,
        }
    }
}

impl RagConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let indexing = IndexingConfig {
            chunk_size: parse_var(&lookup, "DOCQA_CHUNK_SIZE", defaults.indexing.chunk_size)?,
            chunk_overlap: parse_var(&lookup, "DOCQA_CHUNK_OVERLAP", defaults.indexing.chunk_overlap)?,
            batch_size: parse_var(&lookup, "DOCQA_EMBED_BATCH_SIZE", defaults.indexing.batch_size)?,
            embed_concurrency: parse_var(
                &lookup,
                "DOCQA_EMBED_CONCURRENCY",
                defaults.indexing.embed_concurrency,
            )?,
        };

        let skip_unreadable = parse_var(&lookup, "DOCQA_SKIP_UNREADABLE", false)?;

        let config = Self {
            docs_dir: lookup("DOCQA_DOCS_DIR").map(PathBuf::from).unwrap_or(defaults.docs_dir),
            index_dir: lookup("DOCQA_INDEX_DIR").map(PathBuf::from).unwrap_or(defaults.index_dir),
            indexing,
            top_k: parse_var(&lookup, "DOCQA_TOP_K", defaults.top_k)?,
            unreadable: if skip_unreadable {
                UnreadablePolicy::Skip
            } else {
                UnreadablePolicy::Abort
            },
            rebuild_on_stale: parse_var(&lookup, "DOCQA_REBUILD_ON_STALE", false)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the chunker or retriever cannot work with
    pub fn validate(&self) -> Result<()> {
        let indexing = &self.indexing;
        if indexing.chunk_size == 0 {
            return Err(Error::Configuration("chunk size must be greater than zero".to_string()));
        }
        if indexing.chunk_overlap >= indexing.chunk_size {
            return Err(Error::Configuration(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                indexing.chunk_overlap, indexing.chunk_size
            )));
        }
        if indexing.batch_size == 0 || indexing.embed_concurrency == 0 {
            return Err(Error::Configuration(
                "embedding batch size and concurrency must be greater than zero".to_string(),
            ));
        }
        if self.top_k == 0 {
            return Err(Error::Configuration("top_k must be greater than zero".to_string()));
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw.trim().parse::<T>().map_err(|e| {
            Error::Configuration(format!("{} has invalid value '{}': {}", key, raw, e))
        }),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RagConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.docs_dir, PathBuf::from("datasets"));
        assert_eq!(config.index_dir, PathBuf::from("vector_index"));
        assert_eq!(config.indexing.chunk_size, 500);
        assert_eq!(config.indexing.chunk_overlap, 100);
        assert_eq!(config.top_k, 4);
        assert_eq!(config.unreadable, UnreadablePolicy::Abort);
        assert!(!config.rebuild_on_stale);
    }

    #[test]
    fn test_overrides() {
        let config = RagConfig::from_lookup(lookup_from(&[
            ("DOCQA_DOCS_DIR", "/srv/docs"),
            ("DOCQA_INDEX_DIR", "/srv/index"),
            ("DOCQA_CHUNK_SIZE", "800"),
            ("DOCQA_CHUNK_OVERLAP", "0"),
            ("DOCQA_TOP_K", "6"),
            ("DOCQA_SKIP_UNREADABLE", "true"),
            ("DOCQA_REBUILD_ON_STALE", "true"),
        ]))
        .unwrap();
        assert_eq!(config.docs_dir, PathBuf::from("/srv/docs"));
        assert_eq!(config.index_dir, PathBuf::from("/srv/index"));
        assert_eq!(config.indexing.chunk_size, 800);
        assert_eq!(config.indexing.chunk_overlap, 0);
        assert_eq!(config.top_k, 6);
        assert_eq!(config.unreadable, UnreadablePolicy::Skip);
        assert!(config.rebuild_on_stale);
    }

    #[test]
    fn test_invalid_values() {
        let err = RagConfig::from_lookup(lookup_from(&[("DOCQA_CHUNK_SIZE", "big")])).unwrap_err();
        assert!(err.to_string().contains("DOCQA_CHUNK_SIZE"));

        let err = RagConfig::from_lookup(lookup_from(&[
            ("DOCQA_CHUNK_SIZE", "100"),
            ("DOCQA_CHUNK_OVERLAP", "100"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));

        let err = RagConfig::from_lookup(lookup_from(&[("DOCQA_TOP_K", "0")])).unwrap_err();
        assert!(err.to_string().contains("top_k"));
    }
}
