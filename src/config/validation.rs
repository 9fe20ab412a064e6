//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, limits > 0)
//! - Check that header names, methods and URLs parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use axum::http::{HeaderName, HeaderValue, Method};
use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;
use crate::security::headers::is_forwardable;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_upstream(config, &mut errors);
    validate_pipeline(config, &mut errors);

    if config.cache.enabled && config.cache.max_entries == 0 {
        errors.push(ValidationError::new("cache.max_entries", "must be positive when caching is enabled"));
    }

    if config.timeouts.upstream_ms == 0 {
        errors.push(ValidationError::new("timeouts.upstream_ms", "must be positive"));
    }

    if config.retries.enabled && config.retries.max_attempts == 0 {
        errors.push(ValidationError::new("retries.max_attempts", "must be at least 1"));
    }

    if config.rate_limit.enabled
        && (config.rate_limit.requests_per_second == 0 || config.rate_limit.burst_size == 0)
    {
        errors.push(ValidationError::new(
            "rate_limit",
            "requests_per_second and burst_size must be positive when enabled",
        ));
    }

    for origin in &config.cors.allowed_origins {
        if origin != "*" && (origin.trim().is_empty() || HeaderValue::from_str(origin).is_err()) {
            errors.push(ValidationError::new(
                "cors.allowed_origins",
                format!("invalid origin {origin:?}"),
            ));
        }
    }

    check_header_names("cors.allowed_headers", &config.cors.allowed_headers, &mut errors);
    check_header_names("cors.expose_headers", &config.cors.expose_headers, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_upstream(config: &ProxyConfig, errors: &mut Vec<ValidationError>) {
    let upstream = &config.upstream;

    match Url::parse(&upstream.base_url) {
        Ok(url) if !matches!(url.scheme(), "http" | "https") => {
            errors.push(ValidationError::new("upstream.base_url", "scheme must be http or https"));
        }
        Ok(url) if url.host_str().is_none() => {
            errors.push(ValidationError::new("upstream.base_url", "must include a host"));
        }
        Ok(_) => {}
        Err(e) => errors.push(ValidationError::new("upstream.base_url", e.to_string())),
    }

    let has_token = upstream
        .api_token
        .as_deref()
        .is_some_and(|token| !token.trim().is_empty());
    if !has_token {
        errors.push(ValidationError::new(
            "upstream.api_token",
            format!("no credential configured (set api_token or {})", upstream.token_env),
        ));
    }

    if has_token && HeaderValue::from_str(&upstream.credential_value()).is_err() {
        errors.push(ValidationError::new(
            "upstream.api_token",
            "credential_scheme and api_token do not form a valid header value",
        ));
    }

    if HeaderName::from_bytes(upstream.credential_header.as_bytes()).is_err() {
        errors.push(ValidationError::new("upstream.credential_header", "not a valid header name"));
    }

    check_header_names("upstream.forward_headers", &upstream.forward_headers, errors);
    for name in &upstream.forward_headers {
        if let Ok(header) = HeaderName::from_bytes(name.as_bytes()) {
            if !is_forwardable(&header) {
                errors.push(ValidationError::new(
                    "upstream.forward_headers",
                    format!("{name:?} is never forwarded upstream"),
                ));
            }
        }
    }

    if upstream.connect_timeout_secs == 0 {
        errors.push(ValidationError::new("upstream.connect_timeout_secs", "must be positive"));
    }
}

fn validate_pipeline(config: &ProxyConfig, errors: &mut Vec<ValidationError>) {
    let proxy = &config.proxy;

    let mount = proxy.mount_path.as_str();
    if mount != "/" && (!mount.starts_with('/') || mount.ends_with('/')) {
        errors.push(ValidationError::new(
            "proxy.mount_path",
            "must be \"/\" or start with '/' and have no trailing '/'",
        ));
    }

    if proxy.allowed_methods.is_empty() {
        errors.push(ValidationError::new("proxy.allowed_methods", "must not be empty"));
    }
    for method in &proxy.allowed_methods {
        if Method::from_bytes(method.to_uppercase().as_bytes()).is_err() {
            errors.push(ValidationError::new("proxy.allowed_methods", format!("invalid method {method:?}")));
        }
    }

    if proxy.max_body_bytes == 0 {
        errors.push(ValidationError::new("proxy.max_body_bytes", "must be positive"));
    }

    if proxy.allowed_content_types.iter().any(|t| t.trim().is_empty()) {
        errors.push(ValidationError::new("proxy.allowed_content_types", "entries must not be empty"));
    }
}

fn check_header_names(field: &'static str, names: &[String], errors: &mut Vec<ValidationError>) {
    for name in names {
        if HeaderName::from_bytes(name.as_bytes()).is_err() {
            errors.push(ValidationError::new(field, format!("invalid header name {name:?}")));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> ProxyConfig {
        let mut config = ProxyConfig::default();
        config.upstream.api_token = Some("token".to_string());
        config
    }

    #[test]
    fn test_defaults_with_token_are_valid() {
        assert!(validate_config(&valid()).is_ok());
    }

    #[test]
    fn test_missing_token_rejected() {
        let mut config = valid();
        config.upstream.api_token = Some("   ".to_string());

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "upstream.api_token");
    }

    #[test]
    fn test_mount_path_rules() {
        for mount in ["/", "/api", "/v1/tmdb"] {
            let mut config = valid();
            config.proxy.mount_path = mount.to_string();
            assert!(validate_config(&config).is_ok(), "{mount} should be accepted");
        }

        for mount in ["", "api", "/api/"] {
            let mut config = valid();
            config.proxy.mount_path = mount.to_string();
            assert!(validate_config(&config).is_err(), "{mount} should be rejected");
        }
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = valid();
        config.timeouts.upstream_ms = 0;
        config.proxy.max_body_bytes = 0;
        config.cors.allowed_headers.push("bad header".to_string());

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_client_credentials_not_forwardable() {
        let mut config = valid();
        config.upstream.credential_header = "x-api-key".to_string();
        config
            .upstream
            .forward_headers
            .extend(["authorization".to_string(), "cookie".to_string()]);

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.field == "upstream.forward_headers"));
    }

    #[test]
    fn test_zero_connect_timeout_rejected() {
        let mut config = valid();
        config.upstream.connect_timeout_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "upstream.connect_timeout_secs");
    }

    #[test]
    fn test_credential_must_be_header_value() {
        let mut config = valid();
        config.upstream.credential_scheme = "Bearer\n".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "upstream.api_token");
    }

    #[test]
    fn test_cors_origins_must_parse() {
        let mut config = valid();
        config.cors.allowed_origins = vec![
            "*".to_string(),
            "https://app.example".to_string(),
            "https://bad\norigin".to_string(),
            " ".to_string(),
        ];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.field == "cors.allowed_origins"));
    }
}
