//! Structured logging.
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - Log level configurable via config and environment (`RUST_LOG` wins)

use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError, EnvFilter, Layer,
    Registry,
};

use crate::config::{Environment, LogFormat, ObservabilityConfig};

/// Initialize the global subscriber. Fails if one is already installed.
pub fn init_logging(
    config: &ObservabilityConfig,
    environment: Environment,
) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{level},request_gate={level},tower_http={level}",
            level = config.log_level
        ))
    });

    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = match resolve_format(config, environment) {
        LogFormat::Json => fmt::layer().json().with_current_span(true).boxed(),
        LogFormat::Pretty => fmt::layer().boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .try_init()
}

pub fn resolve_format(config: &ObservabilityConfig, environment: Environment) -> LogFormat {
    config.log_format.unwrap_or(if environment.is_production() {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_follows_environment() {
        let config = ObservabilityConfig::default();
        assert_eq!(resolve_format(&config, Environment::Production), LogFormat::Json);
        assert_eq!(resolve_format(&config, Environment::Development), LogFormat::Pretty);
    }

    #[test]
    fn test_explicit_format_wins() {
        let config = ObservabilityConfig {
            log_format: Some(LogFormat::Pretty),
            ..Default::default()
        };
        assert_eq!(resolve_format(&config, Environment::Production), LogFormat::Pretty);
    }
}
