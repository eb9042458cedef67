//! Configuration validation.
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;
use url::Url;

use crate::config::schema::ServiceConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener port must be non-zero")]
    ZeroPort,

    #[error("allowed origin {0:?} is not an http(s) origin")]
    InvalidOrigin(String),

    #[error("permissive CORS cannot be enabled in production")]
    PermissiveInProduction,

    #[error("body limit must be greater than zero")]
    ZeroBodyLimit,

    #[error("data store url {0:?} is invalid")]
    InvalidStoreUrl(String),

    #[error("bootstrap timeout must be greater than zero")]
    ZeroBootstrapTimeout,
}

pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.port == 0 {
        errors.push(ValidationError::ZeroPort);
    }

    for origin in &config.cors.extra_origins {
        if !is_origin(origin) {
            errors.push(ValidationError::InvalidOrigin(origin.clone()));
        }
    }

    if config.cors.permissive && config.environment.is_production() {
        errors.push(ValidationError::PermissiveInProduction);
    }

    if config.body.limit_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if let Some(url) = &config.store.url {
        let parsed = Url::parse(url);
        if parsed.map(|u| u.host_str().is_none()).unwrap_or(true) {
            errors.push(ValidationError::InvalidStoreUrl(url.clone()));
        }
    }

    if config.bootstrap.enabled && config.bootstrap.timeout_secs == 0 {
        errors.push(ValidationError::ZeroBootstrapTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// An origin is scheme + host + optional port, nothing else.
fn is_origin(value: &str) -> bool {
    match Url::parse(value) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().is_some()
                && (url.path() == "/" || url.path().is_empty())
                && url.query().is_none()
                && url.fragment().is_none()
        }
        Err(_) => false,
    }
}
