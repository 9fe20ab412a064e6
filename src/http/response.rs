//! Response handling and transformation.
//!
//! # Responsibilities
//! - Hold a buffered upstream response (shared with the cache)
//! - Add the `x-cache` outcome header
//! - Relay only end-to-end headers to the client
//!
//! # Design Decisions
//! - Responses are buffered so they can be cached and replayed
//! - Hop-by-hop headers are stripped when the response is captured

use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

/// Response header reporting the cache outcome.
pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

/// How the cache took part in answering a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
    /// Not eligible (non-GET or caching disabled).
    Bypass,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
            CacheStatus::Bypass => "BYPASS",
        }
    }
}

/// A fully buffered upstream response with sanitized headers.
#[derive(Debug, Clone)]
pub struct ProxiedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ProxiedResponse {
    /// Render for the client, tagged with the cache outcome.
    pub fn into_client_response(self, cache: CacheStatus) -> Response {
        let mut response = (self.status, Body::from(self.body)).into_response();
        let headers = response.headers_mut();
        for (name, value) in &self.headers {
            headers.append(name.clone(), value.clone());
        }
        headers.insert(X_CACHE, HeaderValue::from_static(cache.as_str()));
        response
    }
}
