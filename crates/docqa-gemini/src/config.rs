//! Gemini configuration

use serde::{Deserialize, Serialize};
use std::env;
use url::Url;
use docqa_core::{Error, Result};

pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_CHAT_MODEL: &str = "gemini-pro";
pub const DEFAULT_EMBEDDING_MODEL: &str = "models/embedding-001";

/// Configuration for the Gemini client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    pub api_url: String,
    pub chat_model: String,
    pub embedding_model: String,
}

impl GeminiConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup("GOOGLE_API_KEY")
            .or_else(|| lookup("GEMINI_API_KEY"))
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::Configuration(
                "GOOGLE_API_KEY or GEMINI_API_KEY environment variable not found".to_string()
            ))?;

        let api_url = lookup("GEMINI_API_URL")
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        Url::parse(&api_url).map_err(|e| {
            Error::Configuration(format!("GEMINI_API_URL '{}' is not a valid URL: {}", api_url, e))
        })?;

        let chat_model = lookup("GEMINI_CHAT_MODEL")
            .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string());

        let embedding_model = lookup("GEMINI_EMBEDDING_MODEL")
            .map(|model| normalize_model_name(&model))
            .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string());

        Ok(Self {
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            chat_model,
            embedding_model,
        })
    }

    /// Create configuration with an explicit key and default endpoints
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            api_url: DEFAULT_API_URL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
        }
    }

    /// Point the client at a different base URL
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }
}

/// The embedding endpoints expect the `models/` prefix in request bodies.
fn normalize_model_name(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{}", model)
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
    fn test_defaults_from_lookup() {
        let config = GeminiConfig::from_lookup(lookup_from(&[("GOOGLE_API_KEY", "abc")])).unwrap();
        assert_eq!(config.api_key, "abc");
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.chat_model, DEFAULT_CHAT_MODEL);
        assert_eq!(config.embedding_model, DEFAULT_EMBEDDING_MODEL);
    }

    #[test]
    fn test_missing_key_is_configuration_error() {
        let err = GeminiConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));

        let err = GeminiConfig::from_lookup(lookup_from(&[("GOOGLE_API_KEY", "  ")])).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_overrides() {
        let config = GeminiConfig::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "fallback"),
            ("GEMINI_API_URL", "http://localhost:8089/v1beta/"),
            ("GEMINI_CHAT_MODEL", "gemini-1.5-flash"),
            ("GEMINI_EMBEDDING_MODEL", "text-embedding-004"),
        ]))
        .unwrap();
        assert_eq!(config.api_key, "fallback");
        assert_eq!(config.api_url, "http://localhost:8089/v1beta");
        assert_eq!(config.chat_model, "gemini-1.5-flash");
        assert_eq!(config.embedding_model, "models/text-embedding-004");
    }

    #[test]
    fn test_invalid_url_rejected() {
        let err = GeminiConfig::from_lookup(lookup_from(&[
            ("GOOGLE_API_KEY", "abc"),
            ("GEMINI_API_URL", "not a url"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_URL"));
    }
}
