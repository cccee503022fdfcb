//! HTTP server configuration

use serde::{Deserialize, Serialize};
use std::env;

use docqa_core::{Error, Result};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;

/// Address the chat server listens on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = match lookup("DOCQA_PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                Error::Configuration(format!("DOCQA_PORT must be a port number, got '{}'", raw))
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            host: lookup("DOCQA_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
        })
    }

    /// `host:port` for binding
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_variables() {
        let config = ServerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.address(), "127.0.0.1:5000");
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(|key| match key {
            "DOCQA_HOST" => Some("0.0.0.0".to_string()),
            "DOCQA_PORT" => Some("8080".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_invalid_port() {
        let err = ServerConfig::from_lookup(|key| {
            (key == "DOCQA_PORT").then(|| "99999".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
