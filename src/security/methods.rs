//! HTTP method whitelisting.

use axum::http::Method;

use crate::config::PipelineConfig;
use crate::error::ProxyError;
use crate::pipeline::{Guard, RequestContext};

/// Rejects verbs that are not explicitly allowed.
#[derive(Debug, Clone)]
pub struct MethodGuard {
    allowed: Vec<Method>,
}

impl MethodGuard {
    pub fn new(allowed: Vec<Method>) -> Self {
        Self { allowed }
    }

    /// Method names are upper-cased; unparsable entries are skipped
    /// (validation already rejected them).
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(parse_methods(&config.allowed_methods))
    }

    pub fn allowed(&self) -> &[Method] {
        &self.allowed
    }
}

/// Parse configured method names.
pub fn parse_methods(names: &[String]) -> Vec<Method> {
    names
        .iter()
        .filter_map(|name| Method::from_bytes(name.to_uppercase().as_bytes()).ok())
        .collect()
}

impl Guard for MethodGuard {
    fn name(&self) -> &'static str {
        "method"
    }

    fn check(&self, ctx: &RequestContext) -> Result<(), ProxyError> {
        if self.allowed.contains(&ctx.method) {
            Ok(())
        } else {
            Err(ProxyError::MethodNotAllowed {
                method: ctx.method.clone(),
                allowed: self.allowed.clone(),
            })
        }
    }
}
