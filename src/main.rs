//! Embedding Server Main
//!
//! Loads the model, then serves HTTP until Ctrl+C

use std::sync::Arc;

use minilm_embed_server::{start_http_server, ModelHost, ServerConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Optional; defaults serve all-MiniLM-L6-v2 on 0.0.0.0:8080
    let config = ServerConfig::load_or_default("config.toml")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.monitoring.filter_directive().into()),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .without_time()
        .init();

    info!("🚀 MiniLM Embedding Server v{}", env!("CARGO_PKG_VERSION"));
    info!("📊 Log Level: {}", config.monitoring.log_level);

    // Loading blocks for seconds; the listener is not bound until it succeeds
    let model_config = config.model.clone();
    let host = tokio::task::spawn_blocking(move || ModelHost::load(&model_config)).await??;

    start_http_server(Arc::new(config), Arc::new(host)).await
}
