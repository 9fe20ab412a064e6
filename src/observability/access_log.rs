//! One structured log line per request.

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::error::Rejection;
use crate::http::request::request_id;
use crate::http::response::X_CACHE;

/// Logs method, path, status, cache outcome, rejection and latency.
///
/// The query string is left out; it may carry client-supplied secrets.
pub async fn access_log_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request_id(request.headers()).to_string();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let cache = response
        .headers()
        .get(X_CACHE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    let rejection = response
        .extensions()
        .get::<Rejection>()
        .map_or("-", |r| r.0);
    let latency_ms = start.elapsed().as_millis() as u64;

    if response.status().is_server_error() {
        tracing::error!(%request_id, %method, %path, status, cache, rejection, latency_ms, "Request failed");
    } else if response.status().is_client_error() {
        tracing::warn!(%request_id, %method, %path, status, cache, rejection, latency_ms, "Request rejected");
    } else {
        tracing::info!(%request_id, %method, %path, status, cache, latency_ms, "Request completed");
    }

    response
}
