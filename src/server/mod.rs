//! Server module

pub mod config;
pub mod http_server;

pub use config::ServerConfig;
pub use http_server::{serve, start_http_server};
