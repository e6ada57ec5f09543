//! Hyper-based HTTP server
//!
//! Routes are matched by hand in a single `service_fn`; there is no
//! middleware stack. Every handler shares one `Arc<ModelHost>`.

use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use hyper::body::to_bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::net::TcpSocket;
use tracing::{debug, error, info};

use crate::models::{EmbeddingError, ModelHost};
use crate::protocol::http::{
    BatchEncodeRequest, BatchEncodeResponse, EncodeRequest, EncodeResponse, HealthResponse,
    HttpErrorResponse,
};
use crate::server::config::ServerConfig;

/// Bind the configured address and serve until Ctrl+C
pub async fn start_http_server(
    config: Arc<ServerConfig>,
    host: Arc<ModelHost>,
) -> Result<(), Box<dyn std::error::Error>> {
    let bind_address = &config.network.bind_address;
    info!("📡 Binding to {}", bind_address);

    let addr: std::net::SocketAddr = bind_address.parse()?;
    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };
    socket.set_reuseaddr(true)?;
    socket.bind(addr)?;
    let listener = socket.listen(1024)?;

    info!("📍 Endpoints:");
    info!("   GET  /health        - Health check");
    info!("   POST /encode        - Embed one text");
    info!("   POST /encode_batch  - Embed a list of texts");

    serve(listener.into_std()?, host, shutdown_signal()).await
}

/// Serve requests on an already-bound listener until `shutdown` resolves
pub async fn serve<F>(
    listener: std::net::TcpListener,
    host: Arc<ModelHost>,
    shutdown: F,
) -> Result<(), Box<dyn std::error::Error>>
where
    F: Future<Output = ()>,
{
    let local_addr = listener.local_addr()?;

    let make_svc = make_service_fn(move |_| {
        let host = Arc::clone(&host);
        async move {
            Ok::<_, Infallible>(service_fn(move |req| handle_request(req, Arc::clone(&host))))
        }
    });

    let server = Server::from_tcp(listener)?
        .http1_keepalive(true)
        .tcp_nodelay(true)
        .serve(make_svc)
        .with_graceful_shutdown(shutdown);

    info!("✅ HTTP server listening on {}", local_addr);
    server.await?;
    info!("🛑 HTTP server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("❌ Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Route one request
pub async fn handle_request(
    req: Request<Body>,
    host: Arc<ModelHost>,
) -> Result<Response<Body>, Infallible> {
    let start_time = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = match (&method, path.as_str()) {
        (&Method::GET, "/health") => handle_health(&host),
        (&Method::POST, "/encode") => handle_encode(req, &host).await,
        (&Method::POST, "/encode_batch") => handle_encode_batch(req, &host).await,
        (_, "/health" | "/encode" | "/encode_batch") => {
            json_response(StatusCode::METHOD_NOT_ALLOWED, &HttpErrorResponse::method_not_allowed())
        }
        _ => json_response(StatusCode::NOT_FOUND, &HttpErrorResponse::not_found()),
    };

    debug!(
        "{} {} -> {} in {:?}",
        method,
        path,
        response.status().as_u16(),
        start_time.elapsed()
    );
    Ok(response)
}

fn handle_health(host: &ModelHost) -> Response<Body> {
    debug!("🏥 Health check requested");
    json_response(StatusCode::OK, &HealthResponse::healthy(host.model_id()))
}

async fn handle_encode(req: Request<Body>, host: &ModelHost) -> Response<Body> {
    let request: EncodeRequest = match read_json(req).await {
        Ok(request) => request,
        Err(message) => return failure("Error encoding text", message),
    };

    let Some(text) = request.text() else {
        return json_response(StatusCode::BAD_REQUEST, &HttpErrorResponse::no_text());
    };

    match host.encode_one(text).await {
        Ok(embedding) => json_response(StatusCode::OK, &EncodeResponse::new(embedding, host.model_id())),
        Err(e) if e.is_invalid_input() => {
            json_response(StatusCode::BAD_REQUEST, &HttpErrorResponse::no_text())
        }
        Err(e) => failure("Error encoding text", error_message(&e)),
    }
}

async fn handle_encode_batch(req: Request<Body>, host: &ModelHost) -> Response<Body> {
    let request: BatchEncodeRequest = match read_json(req).await {
        Ok(request) => request,
        Err(message) => return failure("Error encoding batch", message),
    };

    let Some(texts) = request.texts() else {
        return json_response(StatusCode::BAD_REQUEST, &HttpErrorResponse::no_texts());
    };

    match host.encode_many(texts).await {
        Ok(embeddings) => json_response(
            StatusCode::OK,
            &BatchEncodeResponse::new(embeddings, host.model_id()),
        ),
        Err(e) if e.is_invalid_input() => {
            json_response(StatusCode::BAD_REQUEST, &HttpErrorResponse::no_texts())
        }
        Err(e) => failure("Error encoding batch", error_message(&e)),
    }
}

/// Message sent to the client for a failed encode
///
/// Errors are our own typed values, so their display text carries no stack
/// traces or file paths and is returned as-is.
fn error_message(err: &EmbeddingError) -> String {
    err.to_string()
}

async fn read_json<T: DeserializeOwned>(req: Request<Body>) -> Result<T, String> {
    let body = to_bytes(req.into_body())
        .await
        .map_err(|e| format!("Failed to read request body: {}", e))?;
    serde_json::from_slice(&body).map_err(|e| format!("Invalid JSON body: {}", e))
}

/// Log and report a processing failure as a 500
fn failure(context: &str, message: String) -> Response<Body> {
    error!("❌ {}: {}", context, message);
    json_response(StatusCode::INTERNAL_SERVER_ERROR, &HttpErrorResponse::new(message))
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Body> {
    let (status, bytes) = match serde_json::to_vec(body) {
        Ok(bytes) => (status, bytes),
        Err(e) => {
            error!("❌ Failed to serialize response: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                br#"{"error":"Failed to serialize response"}"#.to_vec(),
            )
        }
    };

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}
