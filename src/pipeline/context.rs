//! Per-request view consumed by the guards.

use axum::http::{header, request::Parts, Method};
use url::Url;

use crate::upstream::UpstreamTarget;

/// Everything the pipeline needs to decide about one inbound request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    /// Path relative to the mount point, always starting with `/`.
    pub path: String,
    pub query: Option<String>,
    /// Declared `Content-Length`, if any.
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
    /// `Transfer-Encoding` present (body length unknown up front).
    pub chunked: bool,
    /// Resolved upstream URL; `None` when the path does not resolve.
    pub upstream_url: Option<Url>,
}

impl RequestContext {
    pub fn from_parts(parts: &Parts, mount_path: &str, target: &UpstreamTarget) -> Self {
        let prefix = if mount_path == "/" { "" } else { mount_path };
        let full_path = parts.uri.path();
        let path = match full_path.strip_prefix(prefix) {
            Some(rest) if rest.starts_with('/') => rest.to_string(),
            Some(rest) => format!("/{rest}"),
            None => full_path.to_string(),
        };
        let query = parts.uri.query().map(str::to_string);

        let content_length = parts
            .headers
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());

        let content_type = parts
            .headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let chunked = parts.headers.contains_key(header::TRANSFER_ENCODING);
        let upstream_url = target.resolve(&path, query.as_deref());

        Self {
            method: parts.method.clone(),
            path,
            query,
            content_length,
            content_type,
            chunked,
            upstream_url,
        }
    }

    /// True if the request carries (or may carry) a body.
    pub fn has_body(&self) -> bool {
        self.chunked || self.content_length.is_some_and(|len| len > 0)
    }
}
