//! Embedding model layer
//!
//! The [`ModelHost`] owns the single model instance the server loads at
//! startup. Everything below it (config, trait, ONNX implementation) exists
//! to build that one host.

pub mod config;
pub mod host;
pub mod model;

// Re-exports
pub use config::ModelConfig;
pub use host::ModelHost;
pub use model::{EmbeddingModel, ModelInfo};

/// Embedding vector type
pub type Embedding = Vec<f32>;

/// Result type for embedding models operations
pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

/// Errors that can occur in embedding models operations
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Model load failed: {error}")]
    ModelLoadFailed { error: String },

    #[error("Inference failed: {model_name} - {error}")]
    InferenceFailed { model_name: String, error: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("IO error: {error}")]
    IoError { error: std::io::Error },

    #[error("TOML parsing error: {error}")]
    TomlError { error: toml::de::Error },
}

impl EmbeddingError {
    /// Whether the caller, not the model, is at fault.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, EmbeddingError::InvalidInput { .. })
    }
}

impl From<std::io::Error> for EmbeddingError {
    fn from(error: std::io::Error) -> Self {
        EmbeddingError::IoError { error }
    }
}

impl From<toml::de::Error> for EmbeddingError {
    fn from(error: toml::de::Error) -> Self {
        EmbeddingError::TomlError { error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EmbeddingError::InferenceFailed {
            model_name: "all-MiniLM-L6-v2".to_string(),
            error: "session poisoned".to_string(),
        };
        assert_eq!(err.to_string(), "Inference failed: all-MiniLM-L6-v2 - session poisoned");
        assert!(!err.is_invalid_input());

        let err = EmbeddingError::InvalidInput { message: "empty".to_string() };
        assert!(err.is_invalid_input());
    }
}
