//! Record of what an index was built from, used to detect stale indexes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use docqa_core::{Error, Result};

pub const MANIFEST_FILE: &str = "manifest.json";

/// Identity of one source file at build time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFingerprint {
    pub file_name: String,
    pub bytes: u64,
    pub md5: String,
}

impl SourceFingerprint {
    pub async fn of_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read(path).await?;
        Ok(Self {
            file_name: path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            bytes: content.len() as u64,
            md5: format!("{:x}", md5::compute(&content)),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexManifest {
    pub created_at: DateTime<Utc>,
    pub embedding_model: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub chunk_count: usize,
    pub sources: Vec<SourceFingerprint>,
}

impl IndexManifest {
    pub async fn load(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join(MANIFEST_FILE);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str(&content)
                .map(Some)
                .map_err(|e| Error::Serialization(format!("{}: {}", path.display(), e))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Io(e)),
        }
    }

    pub async fn save(&self, dir: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        tokio::fs::write(dir.join(MANIFEST_FILE), content).await?;
        Ok(())
    }

    /// Describe build settings that no longer match the recorded ones.
    /// Vectors from a different model are not comparable with new queries.
    pub fn settings_changes(
        &self,
        embedding_model: &str,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Vec<String> {
        let mut changes = Vec::new();
        if self.embedding_model != embedding_model {
            changes.push(format!(
                "embedding model {} -> {}",
                self.embedding_model, embedding_model
            ));
        }
        if self.chunk_size != chunk_size || self.chunk_overlap != chunk_overlap {
            changes.push(format!(
                "chunking {}/{} -> {}/{}",
                self.chunk_size, self.chunk_overlap, chunk_size, chunk_overlap
            ));
        }
        changes
    }

    /// Describe how `current` differs from the recorded sources
    pub fn changes_since(&self, current: &[SourceFingerprint]) -> Vec<String> {
        let recorded: BTreeMap<&str, &SourceFingerprint> = self
            .sources
            .iter()
            .map(|s| (s.file_name.as_str(), s))
            .collect();
        let now: BTreeMap<&str, &SourceFingerprint> = current
            .iter()
            .map(|s| (s.file_name.as_str(), s))
            .collect();

        let mut changes = Vec::new();
        for (name, fingerprint) in &now {
            match recorded.get(name) {
                None => changes.push(format!("added {}", name)),
                Some(old) if old != fingerprint => changes.push(format!("modified {}", name)),
                Some(_) => {}
            }
        }
        for name in recorded.keys() {
            if !now.contains_key(name) {
                changes.push(format!("removed {}", name));
            }
        }
        changes
    }
}
