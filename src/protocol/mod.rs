//! Wire formats spoken by the server

pub mod http;

pub use http::{
    BatchEncodeRequest, BatchEncodeResponse, EncodeRequest, EncodeResponse, HealthResponse,
    HttpErrorResponse,
};
