//! HTTP JSON protocol
//!
//! Request and response bodies for the three endpoints:
//! - `GET /health` -> `{"status": "healthy", "model": "..."}`
//! - `POST /encode` `{"text": "..."}` -> `{"embedding": [...], "dimension": N, "model": "..."}`
//! - `POST /encode_batch` `{"texts": [...]}` -> `{"embeddings": [[...]], "count": N, "dimension": N, "model": "..."}`
//!
//! Errors are always `{"error": "..."}`.

use serde::{Deserialize, Serialize};

use crate::models::Embedding;

/// Message returned when `/encode` gets no usable text
pub const NO_TEXT_PROVIDED: &str = "No text provided";

/// Message returned when `/encode_batch` gets no usable texts
pub const NO_TEXTS_PROVIDED: &str = "No texts provided";

/// Single-text request; a missing or null `text` deserializes to `None`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EncodeRequest {
    #[serde(default)]
    pub text: Option<String>,
}

impl EncodeRequest {
    /// The text to encode, if one was actually provided
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.is_empty())
    }
}

/// Batch request; a missing or null `texts` deserializes to `None`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchEncodeRequest {
    #[serde(default)]
    pub texts: Option<Vec<String>>,
}

impl BatchEncodeRequest {
    /// The texts to encode, if at least one was provided
    pub fn texts(&self) -> Option<&[String]> {
        self.texts.as_deref().filter(|t| !t.is_empty())
    }
}

/// Response for `POST /encode`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodeResponse {
    pub embedding: Embedding,
    pub dimension: usize,
    pub model: String,
}

impl EncodeResponse {
    pub fn new(embedding: Embedding, model: impl Into<String>) -> Self {
        Self {
            dimension: embedding.len(),
            embedding,
            model: model.into(),
        }
    }
}

/// Response for `POST /encode_batch`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchEncodeResponse {
    pub embeddings: Vec<Embedding>,
    pub count: usize,
    /// Width of the first vector, 0 for an empty result
    pub dimension: usize,
    pub model: String,
}

impl BatchEncodeResponse {
    pub fn new(embeddings: Vec<Embedding>, model: impl Into<String>) -> Self {
        Self {
            count: embeddings.len(),
            dimension: embeddings.first().map(Vec::len).unwrap_or(0),
            embeddings,
            model: model.into(),
        }
    }
}

/// HTTP Error Response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpErrorResponse {
    /// Error message
    pub error: String,
}

impl HttpErrorResponse {
    /// Create a new error response
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }

    pub fn no_text() -> Self {
        Self::new(NO_TEXT_PROVIDED)
    }

    pub fn no_texts() -> Self {
        Self::new(NO_TEXTS_PROVIDED)
    }

    pub fn not_found() -> Self {
        Self::new("Not Found")
    }

    pub fn method_not_allowed() -> Self {
        Self::new("Method Not Allowed")
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model: String,
}

impl HealthResponse {
    pub fn healthy(model: impl Into<String>) -> Self {
        Self {
            status: "healthy".to_string(),
            model: model.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_request_text() {
        let req: EncodeRequest = serde_json::from_str(r#"{"text": "Hello world"}"#).unwrap();
        assert_eq!(req.text(), Some("Hello world"));

        for body in [r#"{}"#, r#"{"text": null}"#, r#"{"text": ""}"#] {
            let req: EncodeRequest = serde_json::from_str(body).unwrap();
            assert_eq!(req.text(), None, "body {}", body);
        }

        // Unknown fields are ignored
        let req: EncodeRequest = serde_json::from_str(r#"{"text": "x", "model": "other"}"#).unwrap();
        assert_eq!(req.text(), Some("x"));
    }

    #[test]
    fn test_encode_request_rejects_wrong_type() {
        assert!(serde_json::from_str::<EncodeRequest>(r#"{"text": 42}"#).is_err());
        assert!(serde_json::from_str::<BatchEncodeRequest>(r#"{"texts": "abc"}"#).is_err());
    }

    #[test]
    fn test_batch_request_texts() {
        let req: BatchEncodeRequest = serde_json::from_str(r#"{"texts": ["a", "", "b"]}"#).unwrap();
        assert_eq!(req.texts().map(<[String]>::len), Some(3));

        for body in [r#"{}"#, r#"{"texts": null}"#, r#"{"texts": []}"#] {
            let req: BatchEncodeRequest = serde_json::from_str(body).unwrap();
            assert!(req.texts().is_none(), "body {}", body);
        }
    }

    #[test]
    fn test_encode_response_shape() {
        let response = EncodeResponse::new(vec![0.25, -0.5, 1.0], "all-MiniLM-L6-v2");
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"embedding": [0.25, -0.5, 1.0], "dimension": 3, "model": "all-MiniLM-L6-v2"})
        );
    }

    #[test]
    fn test_batch_response_dimension() {
        let response = BatchEncodeResponse::new(vec![vec![1.0, 2.0], vec![3.0, 4.0]], "m");
        assert_eq!(response.count, 2);
        assert_eq!(response.dimension, 2);

        let empty = BatchEncodeResponse::new(Vec::new(), "m");
        assert_eq!(empty.count, 0);
        assert_eq!(empty.dimension, 0);
    }

    #[test]
    fn test_error_and_health_bodies() {
        assert_eq!(
            serde_json::to_value(HttpErrorResponse::no_text()).unwrap(),
            json!({"error": "No text provided"})
        );
        assert_eq!(
            serde_json::to_value(HttpErrorResponse::no_texts()).unwrap(),
            json!({"error": "No texts provided"})
        );
        assert_eq!(
            serde_json::to_value(HealthResponse::healthy("all-MiniLM-L6-v2")).unwrap(),
            json!({"status": "healthy", "model": "all-MiniLM-L6-v2"})
        );
    }
}
