// src/logging_middleware.rs
//! Middleware for logging every request with its status and latency

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{info, warn};

/// Logs method, path, status and latency for each request.
///
/// Only the path is logged; the query string can carry an authorization code.
pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let latency_ms = started.elapsed().as_millis() as u64;

    if status.is_server_error() {
        warn!(method = %method, path = %path, status = %status, latency_ms, "📤 Response");
    } else {
        info!(method = %method, path = %path, status = %status, latency_ms, "📤 Response");
    }

    response
}
