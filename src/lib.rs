//! MiniLM Embedding Server Library
//!
//! Serves all-MiniLM-L6-v2 sentence embeddings over a small JSON HTTP API

pub mod models;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod protocol;
pub mod server;

// Re-exports
pub use models::{Embedding, EmbeddingError, ModelConfig, ModelHost};
pub use protocol::{EncodeRequest, EncodeResponse};
pub use server::{start_http_server, ServerConfig};
