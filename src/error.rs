//! Error types shared across the proxy.
//!
//! `ProxyError` covers every way a proxied request can end early. Each
//! variant maps to exactly one status code and a JSON body, so handlers and
//! middleware can return it with `?` and let `IntoResponse` shape the reply.

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::config::loader::ConfigError;

/// Marker attached to error responses so the access log can report why a
/// request was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rejection(pub &'static str);

/// Terminal outcome of the request pipeline.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("method {method} is not allowed")]
    MethodNotAllowed { method: Method, allowed: Vec<Method> },

    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("unsupported content type: {}", .content_type.as_deref().unwrap_or("<none>"))]
    UnsupportedMediaType { content_type: Option<String> },

    #[error("invalid upstream path: {reason}")]
    InvalidPath { reason: &'static str },

    #[error("no route for this path")]
    NotFound,

    #[error("rate limit exceeded")]
    RateLimited { retry_after_secs: u64 },

    #[error("upstream did not respond in time")]
    UpstreamTimeout,

    #[error("upstream request failed: {0}")]
    Upstream(String),
}

impl ProxyError {
    /// Status code sent to the client.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            ProxyError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ProxyError::InvalidPath { .. } => StatusCode::BAD_REQUEST,
            ProxyError::NotFound => StatusCode::NOT_FOUND,
            ProxyError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ProxyError::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Stable machine-readable code used in the JSON body and the logs.
    pub fn code(&self) -> &'static str {
        match self {
            ProxyError::MethodNotAllowed { .. } => "method_not_allowed",
            ProxyError::PayloadTooLarge { .. } => "payload_too_large",
            ProxyError::UnsupportedMediaType { .. } => "unsupported_media_type",
            ProxyError::InvalidPath { .. } => "invalid_path",
            ProxyError::NotFound => "not_found",
            ProxyError::RateLimited { .. } => "rate_limited",
            ProxyError::UpstreamTimeout => "upstream_timeout",
            ProxyError::Upstream(_) => "upstream_error",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        // Transport details stay in the logs.
        let message = match &self {
            ProxyError::Upstream(detail) => {
                tracing::error!(error = %detail, "Upstream request failed");
                "upstream request failed".to_string()
            }
            other => other.to_string(),
        };

        let mut response = (status, Json(json!({ "error": code, "message": message }))).into_response();

        match &self {
            ProxyError::MethodNotAllowed { allowed, .. } => {
                let list = allowed
                    .iter()
                    .map(Method::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                if let Ok(value) = HeaderValue::from_str(&list) {
                    response.headers_mut().insert(header::ALLOW, value);
                }
            }
            ProxyError::RateLimited { retry_after_secs } => {
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(*retry_after_secs));
            }
            _ => {}
        }

        response.extensions_mut().insert(Rejection(code));
        response
    }
}

/// Failures while assembling the server before it accepts traffic.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid upstream base URL: {0}")]
    BaseUrl(#[from] url::ParseError),

    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("invalid credential header: {0}")]
    Credential(String),
}
