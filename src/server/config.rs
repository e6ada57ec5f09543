//! Embedding Server Configuration

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::models::{EmbeddingResult, ModelConfig};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub network: NetworkConfig,
    pub model: ModelConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub bind_address: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub log_level: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl MonitoringConfig {
    /// Default `EnvFilter` directive for the configured level
    pub fn filter_directive(&self) -> String {
        let level = match self.log_level.to_lowercase().as_str() {
            "trace" => "trace",
            "debug" => "debug",
            "warn" => "warn",
            "error" => "error",
            _ => "info",
        };
        format!("minilm_embed_server={level},{level}")
    }
}

impl ServerConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> EmbeddingResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    pub fn from_str(content: &str) -> EmbeddingResult<Self> {
        let config: ServerConfig = toml::from_str(content)?;
        config.model.validate()?;
        Ok(config)
    }

    /// Read `path` if it exists, otherwise fall back to the built-in defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> EmbeddingResult<Self> {
        let path = path.as_ref();
        if path.exists() {
            info!("Loading configuration from {}", path.display());
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.network.bind_address, "0.0.0.0:8080");
        assert_eq!(config.model.name, "all-MiniLM-L6-v2");
        assert_eq!(config.monitoring.log_level, "info");
    }

    #[test]
    fn test_empty_file_is_default() {
        let config = ServerConfig::from_str("").unwrap();
        assert_eq!(config.network.bind_address, "0.0.0.0:8080");
        assert_eq!(config.model.embedding_dimension, 384);
    }

    #[test]
    fn test_partial_sections() {
        let config = ServerConfig::from_str(
            r#"
            [network]
            bind_address = "127.0.0.1:9000"

            [model]
            num_threads = 1

            [monitoring]
            log_level = "DEBUG"
            "#,
        )
        .unwrap();

        assert_eq!(config.network.bind_address, "127.0.0.1:9000");
        assert_eq!(config.model.num_threads, 1);
        assert_eq!(config.model.max_sequence_length, 256);
        assert_eq!(
            config.monitoring.filter_directive(),
            "minilm_embed_server=debug,debug"
        );
    }

    #[test]
    fn test_invalid_model_section_is_rejected() {
        let result = ServerConfig::from_str(
            r#"
            [model]
            embedding_dimension = 0
            "#,
        );
        assert!(result.is_err());
        assert!(ServerConfig::from_str("[network]\nbind_address = 5").is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = ServerConfig::load_or_default("definitely-not-here.toml").unwrap();
        assert_eq!(config.network.bind_address, "0.0.0.0:8080");
    }

    #[test]
    fn test_unknown_level_maps_to_info() {
        let monitoring = MonitoringConfig {
            log_level: "verbose".to_string(),
        };
        assert_eq!(monitoring.filter_directive(), "minilm_embed_server=info,info");
    }
}
