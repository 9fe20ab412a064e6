//! Request validation pipeline.
//!
//! # Data Flow
//! ```text
//! inbound request parts
//!     → context.rs (method, relative path, body metadata, upstream URL)
//!     → GuardChain, in order:
//!         MethodGuard       405
//!         BodySizeGuard     413
//!         ContentTypeGuard  415
//!         PathGuard         400
//!     → handler (timeout, cache, upstream fetch)
//! ```
//!
//! # Design Decisions
//! - Guards are pure checks over `RequestContext`; none of them read the body
//! - The first failing guard decides the response
//! - Order is fixed: cheap header checks run before URL resolution checks

pub mod context;

pub use context::RequestContext;

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::security::{BodySizeGuard, ContentTypeGuard, MethodGuard, PathGuard};
use crate::upstream::UpstreamTarget;

/// One stage of the pipeline.
pub trait Guard: Send + Sync + std::fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Accept the request or say why not.
    fn check(&self, ctx: &RequestContext) -> Result<(), ProxyError>;
}

/// Ordered guards; stops at the first rejection.
#[derive(Debug, Default)]
pub struct GuardChain {
    guards: Vec<Box<dyn Guard>>,
}

impl GuardChain {
    pub fn new(guards: Vec<Box<dyn Guard>>) -> Self {
        Self { guards }
    }

    /// The standard chain: method, body size, content type, path.
    pub fn from_config(config: &ProxyConfig, target: &UpstreamTarget) -> Self {
        Self::new(vec![
            Box::new(MethodGuard::from_config(&config.proxy)),
            Box::new(BodySizeGuard::new(config.proxy.max_body_bytes)),
            Box::new(ContentTypeGuard::new(config.proxy.allowed_content_types.clone())),
            Box::new(PathGuard::new(target.clone())),
        ])
    }

    pub fn check(&self, ctx: &RequestContext) -> Result<(), ProxyError> {
        for guard in &self.guards {
            if let Err(e) = guard.check(ctx) {
                tracing::debug!(guard = guard.name(), path = %ctx.path, error = %e, "Request rejected");
                return Err(e);
            }
        }
        Ok(())
    }
}
