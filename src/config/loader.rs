//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{Environment, LogFormat, ServiceConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {value:?}")]
    InvalidEnv { key: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: defaults, then the optional TOML file, then the
/// process environment. The result is validated.
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    let config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => ServiceConfig::default(),
    };

    let config = apply_env(config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay recognised environment variables onto `config`.
///
/// `lookup` abstracts the environment so tests can supply their own.
pub fn apply_env<F>(mut config: ServiceConfig, lookup: F) -> Result<ServiceConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(env) = get("NODE_ENV") {
        config.environment = Environment::parse(&env);
    }

    if let Some(host) = get("HOST") {
        config.listener.host = host;
    }

    if let Some(port) = get("PORT") {
        config.listener.port = port
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidEnv { key: "PORT", value: port })?;
    }

    if let Some(frontend) = get("FRONTEND_URL") {
        if !config.cors.extra_origins.contains(&frontend) {
            config.cors.extra_origins.push(frontend);
        }
    }

    // Explicit flag wins; otherwise only an explicit development mode opts in.
    config.cors.permissive = match get("CORS_PERMISSIVE") {
        Some(flag) => parse_bool(&flag)
            .ok_or(ConfigError::InvalidEnv { key: "CORS_PERMISSIVE", value: flag })?,
        None => config.cors.permissive || config.environment.is_development(),
    };

    if let Some(url) = get("DATABASE_URL") {
        config.store.url = Some(url);
    }

    if let Some(limit) = get("BODY_LIMIT_BYTES") {
        config.body.limit_bytes = limit
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidEnv { key: "BODY_LIMIT_BYTES", value: limit })?;
    }

    if let Some(level) = get("LOG_LEVEL") {
        config.observability.log_level = level;
    }

    if let Some(format) = get("LOG_FORMAT") {
        config.observability.log_format = Some(match format.to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" | "text" => LogFormat::Pretty,
            _ => return Err(ConfigError::InvalidEnv { key: "LOG_FORMAT", value: format }),
        });
    }

    Ok(config)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
