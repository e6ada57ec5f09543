//! # ONNX Embedding Engine
//!
//! Sentence embeddings with ONNX Runtime and a HuggingFace tokenizer:
//! tokenize, run the transformer, mean-pool `last_hidden_state` over the
//! attention mask, then L2-normalize. For all-MiniLM-L6-v2 this yields the
//! same 384-dimensional vectors as the sentence-transformers pipeline.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = OnnxEmbeddingEngine::new(&model_path, &tokenizer_path, &OnnxConfig::default())?;
//! let embeddings = engine.embed_texts(&["Hello world".to_string()])?;
//! ```

use std::fmt::Display;
use std::path::{Path, PathBuf};

use crate::models::{Embedding, EmbeddingError, EmbeddingResult, ModelConfig};
use ndarray::ArrayViewD;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info, instrument};

/// File names inside a sentence-transformers Hub repository
const HUB_MODEL_FILE: &str = "onnx/model.onnx";
const HUB_TOKENIZER_FILE: &str = "tokenizer.json";

/// Configuration for ONNX Runtime
#[derive(Debug, Clone)]
pub struct OnnxConfig {
    /// Path to ONNX Runtime library (DLL/so/dylib); empty keeps the default lookup
    pub library_path: String,
    /// Thread pool size for inference
    pub thread_pool_size: usize,
    /// Inputs longer than this many tokens are truncated
    pub max_seq_length: usize,
}

impl Default for OnnxConfig {
    fn default() -> Self {
        Self {
            library_path: String::new(),
            thread_pool_size: 4,
            max_seq_length: 256,
        }
    }
}

fn load_error<E: Display>(context: &str) -> impl Fn(E) -> EmbeddingError + '_ {
    move |e| EmbeddingError::ModelLoadFailed {
        error: format!("{}: {}", context, e),
    }
}

fn inference_error(context: &str, e: impl Display) -> EmbeddingError {
    EmbeddingError::InferenceFailed {
        model_name: "onnx".to_string(),
        error: format!("{}: {}", context, e),
    }
}

/// Locate model.onnx and tokenizer.json for `config`
///
/// Configured local files win; otherwise both are fetched from the Hub repo
/// (or taken from the local Hub cache when already downloaded).
pub fn resolve_model_files(config: &ModelConfig) -> EmbeddingResult<(PathBuf, PathBuf)> {
    if let Some(files) = config.local_files() {
        debug!("Using local model files {:?}", files);
        return Ok(files);
    }

    if config.model_path.is_some() || config.tokenizer_path.is_some() {
        info!("⚠️  Configured model files not found, falling back to {}", config.repo_id);
    }

    info!("⬇️  Resolving {} from the HuggingFace Hub", config.repo_id);
    let api = hf_hub::api::sync::Api::new().map_err(|e| EmbeddingError::ModelLoadFailed {
        error: format!("Failed to initialise Hub client: {}", e),
    })?;
    let repo = api.model(config.repo_id.clone());

    let fetch = |file: &str| {
        repo.get(file).map_err(|e| EmbeddingError::ModelLoadFailed {
            error: format!("Failed to fetch {}/{}: {}", config.repo_id, file, e),
        })
    };

    let model_path = fetch(HUB_MODEL_FILE)?;
    let tokenizer_path = fetch(HUB_TOKENIZER_FILE)?;
    Ok((model_path, tokenizer_path))
}

/// ONNX-based embedding engine for generating text embeddings
#[derive(Debug)]
pub struct OnnxEmbeddingEngine {
    /// ONNX Runtime session for model inference
    session: Session,
    /// HuggingFace tokenizer for text preprocessing
    tokenizer: Tokenizer,
}

impl OnnxEmbeddingEngine {
    /// Create a new ONNX embedding engine
    ///
    /// # Arguments
    /// * `model_path` - Path to the ONNX model file (model.onnx)
    /// * `tokenizer_path` - Path to the tokenizer configuration file (tokenizer.json)
    /// * `onnx_config` - ONNX Runtime configuration
    pub fn new(model_path: &Path, tokenizer_path: &Path, onnx_config: &OnnxConfig) -> EmbeddingResult<Self> {
        info!("Initializing ONNX embedding engine with model: {}", model_path.display());

        if !onnx_config.library_path.is_empty() {
            std::env::set_var("ORT_DYLIB_PATH", &onnx_config.library_path);
            debug!("Set ORT_DYLIB_PATH to: {}", onnx_config.library_path);
        }

        let session = Session::builder()
            .map_err(load_error("Failed to create session builder"))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(load_error("Failed to set optimization level"))?
            .with_intra_threads(onnx_config.thread_pool_size)
            .map_err(load_error("Failed to set intra threads"))?
            .commit_from_file(model_path)
            .map_err(load_error("Failed to load ONNX model"))?;

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| EmbeddingError::ModelLoadFailed {
                error: format!("Failed to load tokenizer: {}", e),
            })?;

        // One text per run, so padding is never needed
        tokenizer.with_padding(None);
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: onnx_config.max_seq_length,
                ..Default::default()
            }))
            .map_err(|e| EmbeddingError::ModelLoadFailed {
                error: format!("Failed to configure truncation: {}", e),
            })?;

        info!("ONNX embedding engine initialized successfully with {} threads", onnx_config.thread_pool_size);
        Ok(Self { session, tokenizer })
    }

    /// Width of the vectors this model produces, measured with a probe text
    pub fn output_dimension(&mut self) -> EmbeddingResult<usize> {
        let probe = self.embed_texts(&["dimension probe".to_string()])?;
        Ok(probe.first().map(Vec::len).unwrap_or(0))
    }

    /// Generate embeddings for a batch of texts
    ///
    /// Texts run through the session one at a time, so the output for a text
    /// never depends on its batch neighbours.
    #[instrument(skip(self, texts), fields(text_count = texts.len()))]
    pub fn embed_texts(&mut self, texts: &[String]) -> EmbeddingResult<Vec<Embedding>> {
        if texts.is_empty() {
            return Err(EmbeddingError::InvalidInput {
                message: "Cannot embed empty text list".to_string(),
            });
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed_one(text)?);
        }

        debug!("Successfully generated {} embeddings", embeddings.len());
        Ok(embeddings)
    }

    fn embed_one(&mut self, text: &str) -> EmbeddingResult<Embedding> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| inference_error("Tokenization failed", e))?;

        let attention_mask = encoding.get_attention_mask();
        let seq_len = encoding.get_ids().len() as i64;

        let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&x| x as i64).collect();
        let mask: Vec<i64> = attention_mask.iter().map(|&x| x as i64).collect();
        let token_type_ids: Vec<i64> = vec![0i64; input_ids.len()];

        // Shape [1, seq_len] for a single sequence
        let input_ids = Tensor::from_array(([1i64, seq_len], input_ids))
            .map_err(|e| inference_error("Failed to create input_ids tensor", e))?;
        let mask = Tensor::from_array(([1i64, seq_len], mask))
            .map_err(|e| inference_error("Failed to create attention_mask tensor", e))?;
        let token_type_ids = Tensor::from_array(([1i64, seq_len], token_type_ids))
            .map_err(|e| inference_error("Failed to create token_type_ids tensor", e))?;

        let outputs = self
            .session
            .run(vec![
                ("input_ids", input_ids),
                ("attention_mask", mask),
                ("token_type_ids", token_type_ids),
            ])
            .map_err(|e| inference_error("ONNX inference failed", e))?;

        let (shape, data) = outputs["last_hidden_state"]
            .try_extract_tensor::<f32>()
            .map_err(|e| inference_error("Failed to extract output tensor", e))?;

        let dims: Vec<usize> = shape.iter().map(|&x| x as usize).collect();
        let hidden = ndarray::ArrayView::from_shape(dims.as_slice(), data)
            .map_err(|e| inference_error("Failed to create output array view", e))?;

        let pooled = mean_pooling(&hidden, attention_mask)?;
        Ok(normalize_embedding(pooled))
    }
}

/// Average token embeddings `[1, seq_len, hidden]` over positions where the
/// attention mask is 1
pub fn mean_pooling(output_tensor: &ArrayViewD<f32>, attention_mask: &[u32]) -> EmbeddingResult<Embedding> {
    let shape = output_tensor.shape();
    if shape.len() != 3 {
        return Err(inference_error(
            "Unexpected output tensor",
            format!("expected 3 dimensions, got {}", shape.len()),
        ));
    }

    let seq_len = shape[1];
    let hidden_size = shape[2];

    if attention_mask.len() != seq_len {
        return Err(inference_error(
            "Unexpected output tensor",
            format!(
                "attention mask length {} doesn't match sequence length {}",
                attention_mask.len(),
                seq_len
            ),
        ));
    }

    let mut pooled = vec![0.0f32; hidden_size];
    let mut valid_tokens = 0usize;

    for (seq_idx, &mask) in attention_mask.iter().enumerate() {
        if mask == 1 {
            for (hidden_idx, value) in pooled.iter_mut().enumerate() {
                *value += output_tensor[[0, seq_idx, hidden_idx]];
            }
            valid_tokens += 1;
        }
    }

    if valid_tokens == 0 {
        return Err(inference_error("Mean pooling failed", "no valid tokens in attention mask"));
    }

    for value in &mut pooled {
        *value /= valid_tokens as f32;
    }

    Ok(pooled)
}

/// L2-normalize; a zero vector is returned unchanged
pub fn normalize_embedding(mut embedding: Embedding) -> Embedding {
    let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in &mut embedding {
            *value /= norm;
        }
    }
    embedding
}
