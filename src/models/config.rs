//! Configuration for the embedding model
//!
//! Describes which model to load and where its files live. Every field has a
//! default matching all-MiniLM-L6-v2, so an empty `[model]` table is valid.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::{EmbeddingError, EmbeddingResult};

/// Configuration for the hosted model
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model identifier reported in every response
    pub name: String,
    /// HuggingFace Hub repository used when local files are not configured
    pub repo_id: String,

    /// Local ONNX export (model.onnx)
    pub model_path: Option<String>,
    /// Local tokenizer definition (tokenizer.json)
    pub tokenizer_path: Option<String>,

    /// Model parameters
    pub embedding_dimension: usize,
    pub max_sequence_length: usize,

    /// Intra-op threads for ONNX Runtime
    pub num_threads: usize,
    /// Path to the ONNX Runtime shared library (load-dynamic builds)
    pub onnx_runtime_path: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "all-MiniLM-L6-v2".to_string(),
            repo_id: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            model_path: None,
            tokenizer_path: None,
            embedding_dimension: 384,
            max_sequence_length: 256,
            num_threads: 4,
            onnx_runtime_path: None,
        }
    }
}

impl ModelConfig {
    /// Load configuration from string
    pub fn from_str(content: &str) -> EmbeddingResult<Self> {
        let config: ModelConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> EmbeddingResult<()> {
        if self.name.trim().is_empty() {
            return Err(EmbeddingError::ConfigError {
                message: "Model name cannot be empty".to_string(),
            });
        }

        if self.embedding_dimension == 0 {
            return Err(EmbeddingError::ConfigError {
                message: format!("Model '{}' has zero embedding dimension", self.name),
            });
        }

        if self.max_sequence_length == 0 {
            return Err(EmbeddingError::ConfigError {
                message: format!("Model '{}' has zero max sequence length", self.name),
            });
        }

        let has_local_paths = self.model_path.is_some() && self.tokenizer_path.is_some();
        if !has_local_paths && self.repo_id.trim().is_empty() {
            return Err(EmbeddingError::ConfigError {
                message: format!(
                    "Model '{}' needs either local model/tokenizer paths or a repo_id",
                    self.name
                ),
            });
        }

        Ok(())
    }

    /// Local model and tokenizer files, if both are configured and present.
    pub fn local_files(&self) -> Option<(PathBuf, PathBuf)> {
        let model = PathBuf::from(self.model_path.as_ref()?);
        let tokenizer = PathBuf::from(self.tokenizer_path.as_ref()?);
        if model.exists() && tokenizer.exists() {
            Some((model, tokenizer))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_describe_minilm() {
        let config = ModelConfig::default();
        assert_eq!(config.name, "all-MiniLM-L6-v2");
        assert_eq!(config.embedding_dimension, 384);
        assert_eq!(config.max_sequence_length, 256);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = ModelConfig::from_str(
            r#"
            model_path = "models/all-MiniLM-L6-v2/model.onnx"
            tokenizer_path = "models/all-MiniLM-L6-v2/tokenizer.json"
            num_threads = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.name, "all-MiniLM-L6-v2");
        assert_eq!(config.num_threads, 2);
        assert_eq!(config.model_path.as_deref(), Some("models/all-MiniLM-L6-v2/model.onnx"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_configs() {
        let config = ModelConfig { embedding_dimension: 0, ..ModelConfig::default() };
        assert!(config.validate().is_err());

        let config = ModelConfig { name: "  ".to_string(), ..ModelConfig::default() };
        assert!(config.validate().is_err());

        let config = ModelConfig { repo_id: String::new(), ..ModelConfig::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_local_files_are_ignored() {
        let config = ModelConfig {
            model_path: Some("does/not/exist/model.onnx".to_string()),
            tokenizer_path: Some("does/not/exist/tokenizer.json".to_string()),
            ..ModelConfig::default()
        };
        assert!(config.local_files().is_none());
    }
}
