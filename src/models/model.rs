//! Model definitions and traits
//!
//! This module defines the trait every embedding backend implements and the
//! ONNX-backed implementation used in production.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::{Embedding, EmbeddingResult};

/// Information about a model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model name
    pub name: String,
    /// Embedding dimension
    pub dimension: usize,
    /// Maximum sequence length
    pub max_sequence_length: usize,
}

/// Core embedding model trait
///
/// Implementations must be deterministic: the same input text always maps to
/// the same vector.
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    /// Get model information
    fn info(&self) -> &ModelInfo;

    /// Generate embeddings for a batch of texts, one vector per input, in order
    async fn embed_batch(&self, texts: &[String]) -> EmbeddingResult<Vec<Embedding>>;

    /// Get the embedding dimension
    fn dimension(&self) -> usize {
        self.info().dimension
    }
}

/// ONNX-based embedding model implementation
#[cfg(feature = "onnx")]
pub mod onnx {
    use super::*;
    use crate::models::config::ModelConfig;
    use crate::models::EmbeddingError;
    use crate::onnx::{OnnxConfig, OnnxEmbeddingEngine};
    use std::sync::{Arc, Mutex};

    /// ONNX embedding model
    ///
    /// `Session::run` needs exclusive access, so the engine sits behind a
    /// mutex and inference runs on tokio's blocking pool.
    pub struct OnnxEmbeddingModel {
        info: ModelInfo,
        engine: Arc<Mutex<OnnxEmbeddingEngine>>,
    }

    impl OnnxEmbeddingModel {
        /// Load the ONNX model described by `config`
        ///
        /// Blocking: may download files and builds the runtime session.
        pub fn load(config: &ModelConfig) -> EmbeddingResult<Self> {
            let (model_path, tokenizer_path) = crate::onnx::resolve_model_files(config)?;

            let onnx_config = OnnxConfig {
                library_path: config.onnx_runtime_path.clone().unwrap_or_default(),
                thread_pool_size: config.num_threads,
                max_seq_length: config.max_sequence_length,
            };
            let mut engine = OnnxEmbeddingEngine::new(&model_path, &tokenizer_path, &onnx_config)?;

            // Probe once so a wrong export fails at startup, not on the first request
            let width = engine.output_dimension()?;
            if width != config.embedding_dimension {
                return Err(EmbeddingError::ModelLoadFailed {
                    error: format!(
                        "Model '{}' produces {}-dimensional vectors, expected {}",
                        config.name, width, config.embedding_dimension
                    ),
                });
            }

            Ok(Self {
                info: ModelInfo {
                    name: config.name.clone(),
                    dimension: config.embedding_dimension,
                    max_sequence_length: config.max_sequence_length,
                },
                engine: Arc::new(Mutex::new(engine)),
            })
        }
    }

    #[async_trait]
    impl EmbeddingModel for OnnxEmbeddingModel {
        fn info(&self) -> &ModelInfo {
            &self.info
        }

        async fn embed_batch(&self, texts: &[String]) -> EmbeddingResult<Vec<Embedding>> {
            let engine = Arc::clone(&self.engine);
            let texts = texts.to_vec();
            let model_name = self.info.name.clone();

            let result = tokio::task::spawn_blocking(move || {
                let mut engine = engine.lock().map_err(|_| EmbeddingError::InferenceFailed {
                    model_name: model_name.clone(),
                    error: "ONNX engine lock poisoned".to_string(),
                })?;
                engine.embed_texts(&texts)
            })
            .await
            .map_err(|e| EmbeddingError::InferenceFailed {
                model_name: self.info.name.clone(),
                error: format!("Inference task failed: {}", e),
            })?;

            // The engine does not know which model it runs
            result.map_err(|e| match e {
                EmbeddingError::InferenceFailed { error, .. } => EmbeddingError::InferenceFailed {
                    model_name: self.info.name.clone(),
                    error,
                },
                other => other,
            })
        }
    }
}
