//! Request body limits.
//!
//! # Responsibilities
//! - Enforce maximum request body size from the declared length
//! - Enforce the accepted media types for requests with a body
//!
//! # Design Decisions
//! - Limits checked before the body is read (early rejection)
//! - Bodies of unknown length are bounded again while buffering
//! - Return 413 Payload Too Large or 415 Unsupported Media Type

use crate::error::ProxyError;
use crate::pipeline::{Guard, RequestContext};

/// Rejects requests whose declared body exceeds the limit.
#[derive(Debug, Clone)]
pub struct BodySizeGuard {
    max_bytes: usize,
}

impl BodySizeGuard {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }
}

impl Guard for BodySizeGuard {
    fn name(&self) -> &'static str {
        "body_size"
    }

    fn check(&self, ctx: &RequestContext) -> Result<(), ProxyError> {
        match ctx.content_length {
            Some(len) if len > self.max_bytes as u64 => Err(ProxyError::PayloadTooLarge {
                limit: self.max_bytes,
            }),
            _ => Ok(()),
        }
    }
}

/// Requires an accepted media type on requests that carry a body.
#[derive(Debug, Clone)]
pub struct ContentTypeGuard {
    allowed: Vec<String>,
}

impl ContentTypeGuard {
    pub fn new(allowed: Vec<String>) -> Self {
        Self {
            allowed: allowed.iter().map(|t| t.trim().to_ascii_lowercase()).collect(),
        }
    }
}

/// `application/json; charset=utf-8` → `application/json`.
fn media_type_essence(value: &str) -> String {
    value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

impl Guard for ContentTypeGuard {
    fn name(&self) -> &'static str {
        "content_type"
    }

    fn check(&self, ctx: &RequestContext) -> Result<(), ProxyError> {
        if !ctx.has_body() {
            return Ok(());
        }

        let accepted = ctx
            .content_type
            .as_deref()
            .map(media_type_essence)
            .is_some_and(|essence| self.allowed.iter().any(|a| *a == essence));

        if accepted {
            Ok(())
        } else {
            Err(ProxyError::UnsupportedMediaType {
                content_type: ctx.content_type.clone(),
            })
        }
    }
}
