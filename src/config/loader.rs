//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ProxyConfig, ConfigError> {
    let config: ProxyConfig = toml::from_str(content)?;
    finish(config)
}

/// Built-in defaults, completed from the environment.
pub fn default_config() -> Result<ProxyConfig, ConfigError> {
    finish(ProxyConfig::default())
}

fn finish(mut config: ProxyConfig) -> Result<ProxyConfig, ConfigError> {
    resolve_credential(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Fill `upstream.api_token` from the environment when the file leaves it empty.
pub fn resolve_credential(config: &mut ProxyConfig) {
    let missing = config
        .upstream
        .api_token
        .as_deref()
        .map_or(true, |token| token.trim().is_empty());

    if missing {
        if let Ok(token) = std::env::var(&config.upstream.token_env) {
            tracing::debug!(variable = %config.upstream.token_env, "Upstream credential read from environment");
            config.upstream.api_token = Some(token);
        }
    }
}
