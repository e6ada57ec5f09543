//! Model Host
//!
//! Holds the one embedding model the process serves for its whole lifetime
//! and enforces the input rules shared by every caller.

use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::models::config::ModelConfig;
use crate::models::model::EmbeddingModel;
use crate::models::{Embedding, EmbeddingError, EmbeddingResult};

/// Single long-lived embedding model, shared by all request handlers
pub struct ModelHost {
    model: Arc<dyn EmbeddingModel>,
}

impl ModelHost {
    /// Wrap an already-constructed model
    pub fn new(model: Arc<dyn EmbeddingModel>) -> Self {
        Self { model }
    }

    /// Load the model described by `config`
    ///
    /// Blocking and potentially slow (file download, session build, probe
    /// inference). Call before binding the listener.
    #[cfg(feature = "onnx")]
    pub fn load(config: &ModelConfig) -> EmbeddingResult<Self> {
        config.validate()?;
        info!("📦 Loading embedding model {}...", config.name);

        let model = crate::models::model::onnx::OnnxEmbeddingModel::load(config)?;

        info!("✅ Model {} loaded ({} dimensions)", config.name, config.embedding_dimension);
        Ok(Self::new(Arc::new(model)))
    }

    #[cfg(not(feature = "onnx"))]
    pub fn load(config: &ModelConfig) -> EmbeddingResult<Self> {
        config.validate()?;
        Err(EmbeddingError::ModelLoadFailed {
            error: format!(
                "Cannot load '{}': built without the `onnx` feature",
                config.name
            ),
        })
    }

    /// Identifier of the hosted model
    pub fn model_id(&self) -> &str {
        &self.model.info().name
    }

    /// Output vector width
    pub fn dimension(&self) -> usize {
        self.model.dimension()
    }

    /// Encode a single text
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub async fn encode_one(&self, text: &str) -> EmbeddingResult<Embedding> {
        if text.is_empty() {
            return Err(EmbeddingError::InvalidInput {
                message: "text cannot be empty".to_string(),
            });
        }

        let mut embeddings = self.model.embed_batch(&[text.to_string()]).await?;
        match embeddings.pop() {
            Some(embedding) if embeddings.is_empty() => Ok(embedding),
            _ => Err(EmbeddingError::InferenceFailed {
                model_name: self.model_id().to_string(),
                error: "Model did not return exactly one embedding".to_string(),
            }),
        }
    }

    /// Encode a batch of texts; output position `i` belongs to input `i`
    #[instrument(skip(self, texts), fields(text_count = texts.len()))]
    pub async fn encode_many(&self, texts: &[String]) -> EmbeddingResult<Vec<Embedding>> {
        if texts.is_empty() {
            return Err(EmbeddingError::InvalidInput {
                message: "texts cannot be empty".to_string(),
            });
        }

        let embeddings = self.model.embed_batch(texts).await?;
        if embeddings.len() != texts.len() {
            return Err(EmbeddingError::InferenceFailed {
                model_name: self.model_id().to_string(),
                error: format!(
                    "Model returned {} embeddings for {} texts",
                    embeddings.len(),
                    texts.len()
                ),
            });
        }

        debug!("Encoded {} texts", embeddings.len());
        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::model::ModelInfo;
    use async_trait::async_trait;

    /// Maps each text to a vector seeded by its bytes
    struct EchoModel {
        info: ModelInfo,
    }

    impl EchoModel {
        fn new(dimension: usize) -> Self {
            Self {
                info: ModelInfo {
                    name: "echo".to_string(),
                    dimension,
                    max_sequence_length: 16,
                },
            }
        }
    }

    #[async_trait]
    impl EmbeddingModel for EchoModel {
        fn info(&self) -> &ModelInfo {
            &self.info
        }

        async fn embed_batch(&self, texts: &[String]) -> EmbeddingResult<Vec<Embedding>> {
            Ok(texts
                .iter()
                .map(|t| vec![t.len() as f32; self.info.dimension])
                .collect())
        }
    }

    /// Drops the last embedding of every batch
    struct ShortModel {
        info: ModelInfo,
    }

    #[async_trait]
    impl EmbeddingModel for ShortModel {
        fn info(&self) -> &ModelInfo {
            &self.info
        }

        async fn embed_batch(&self, texts: &[String]) -> EmbeddingResult<Vec<Embedding>> {
            Ok(texts.iter().skip(1).map(|_| vec![0.0; self.info.dimension]).collect())
        }
    }

    #[tokio::test]
    async fn test_encode_one() {
        let host = ModelHost::new(Arc::new(EchoModel::new(8)));
        let embedding = host.encode_one("hello").await.unwrap();
        assert_eq!(embedding, vec![5.0; 8]);
        assert_eq!(host.model_id(), "echo");
        assert_eq!(host.dimension(), 8);
    }

    #[tokio::test]
    async fn test_encode_one_rejects_empty_text() {
        let host = ModelHost::new(Arc::new(EchoModel::new(8)));
        let err = host.encode_one("").await.unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[tokio::test]
    async fn test_encode_many_preserves_order() {
        let host = ModelHost::new(Arc::new(EchoModel::new(4)));
        let texts = vec!["a".to_string(), "abc".to_string(), "".to_string(), "ab".to_string()];
        let embeddings = host.encode_many(&texts).await.unwrap();

        let firsts: Vec<f32> = embeddings.iter().map(|e| e[0]).collect();
        assert_eq!(firsts, vec![1.0, 3.0, 0.0, 2.0]);
    }

    #[tokio::test]
    async fn test_encode_many_rejects_empty_batch() {
        let host = ModelHost::new(Arc::new(EchoModel::new(4)));
        let err = host.encode_many(&[]).await.unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[tokio::test]
    async fn test_count_mismatch_is_inference_failure() {
        let host = ModelHost::new(Arc::new(ShortModel {
            info: ModelInfo {
                name: "short".to_string(),
                dimension: 4,
                max_sequence_length: 16,
            },
        }));

        let err = host
            .encode_many(&["a".to_string(), "b".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, EmbeddingError::InferenceFailed { .. }));

        let err = host.encode_one("a").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::InferenceFailed { .. }));
    }

    #[test]
    fn test_load_rejects_invalid_config() {
        let config = ModelConfig {
            embedding_dimension: 0,
            ..ModelConfig::default()
        };
        assert!(matches!(
            ModelHost::load(&config),
            Err(EmbeddingError::ConfigError { .. })
        ));
    }
}
