//! ONNX Runtime backend
//!
//! This module provides ONNX-based embedding functionality

pub mod onnx_engine;
pub use onnx_engine::{resolve_model_files, OnnxConfig, OnnxEmbeddingEngine};
