//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the edge proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// The single upstream API being proxied.
    pub upstream: UpstreamConfig,

    /// Request validation settings for the proxied mount.
    pub proxy: PipelineConfig,

    /// In-memory response cache.
    pub cache: CacheConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Retry configuration.
    pub retries: RetryConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Cross-origin resource sharing.
    pub cors: CorsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL every proxied path is resolved against.
    pub base_url: String,

    /// Static credential forwarded on every request.
    /// Falls back to the `token_env` environment variable when unset.
    pub api_token: Option<String>,

    /// Environment variable holding the credential.
    pub token_env: String,

    /// Header carrying the credential.
    pub credential_header: String,

    /// Scheme prefix of the credential value (e.g., "Bearer").
    pub credential_scheme: String,

    /// Client request headers copied onto the upstream request.
    pub forward_headers: Vec<String>,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.themoviedb.org/3/".to_string(),
            api_token: None,
            token_env: "UPSTREAM_API_TOKEN".to_string(),
            credential_header: "authorization".to_string(),
            credential_scheme: "Bearer".to_string(),
            forward_headers: vec![
                "accept".to_string(),
                "accept-language".to_string(),
                "content-type".to_string(),
                "if-none-match".to_string(),
            ],
            connect_timeout_secs: 5,
        }
    }
}

impl UpstreamConfig {
    /// Value sent in `credential_header`: `"{scheme} {token}"`, or the bare
    /// token when no scheme is configured.
    pub fn credential_value(&self) -> String {
        let token = self.api_token.as_deref().unwrap_or_default().trim();
        if self.credential_scheme.is_empty() {
            token.to_string()
        } else {
            format!("{} {}", self.credential_scheme, token)
        }
    }
}

/// Validation applied to requests under the proxied mount.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Path prefix under which requests are proxied (e.g., "/api").
    pub mount_path: String,

    /// HTTP methods accepted for forwarding.
    pub allowed_methods: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Media types accepted for requests carrying a body.
    pub allowed_content_types: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mount_path: "/api".to_string(),
            allowed_methods: vec!["GET".to_string(), "POST".to_string(), "DELETE".to_string()],
            max_body_bytes: 1024 * 1024, // 1MB
            allowed_content_types: vec!["application/json".to_string()],
        }
    }
}

/// Response cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache successful GET responses.
    pub enabled: bool,

    /// Maximum number of cached responses.
    pub max_entries: usize,

    /// Entry lifetime in seconds (0 = no expiry).
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 500,
            ttl_secs: 300,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Deadline for cache lookup plus upstream fetch, in milliseconds.
    pub upstream_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { upstream_ms: 10_000 }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Enable retries for idempotent requests.
    pub enabled: bool,

    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 2,
            base_delay_ms: 100,
            max_delay_ms: 1000,
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Sustained requests per second per client.
    pub requests_per_second: u32,

    /// Burst capacity.
    pub burst_size: u32,

    /// Key clients by the first X-Forwarded-For entry instead of the peer address.
    pub trust_forwarded_for: bool,

    /// Drop buckets idle for longer than this many seconds.
    pub idle_eviction_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            requests_per_second: 10,
            burst_size: 20,
            trust_forwarded_for: false,
            idle_eviction_secs: 300,
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins; `"*"` allows any.
    pub allowed_origins: Vec<String>,

    /// Request headers browsers may send.
    pub allowed_headers: Vec<String>,

    /// Response headers exposed to scripts.
    pub expose_headers: Vec<String>,

    /// Preflight cache lifetime in seconds.
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allowed_headers: vec!["content-type".to_string(), "accept".to_string()],
            expose_headers: vec!["x-cache".to_string(), "x-request-id".to_string()],
            max_age_secs: 86_400,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log line format.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}
