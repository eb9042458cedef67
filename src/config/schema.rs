//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Origins that are always allowed to make cross-origin requests.
pub const STATIC_ALLOWED_ORIGINS: [&str; 2] = ["http://localhost:3001", "http://localhost:3000"];

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Deployment mode.
    pub environment: Environment,

    /// Listener configuration (host, port).
    pub listener: ListenerConfig,

    /// Cross-origin policy.
    pub cors: CorsConfig,

    /// Request body decoding.
    pub body: BodyConfig,

    /// Data store used by health checks and bootstrap.
    pub store: StoreConfig,

    /// One-time startup work.
    pub bootstrap: BootstrapConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// API documentation settings.
    pub docs: DocsConfig,
}

impl ServiceConfig {
    /// Ordered, de-duplicated origin allow-list: the static origins first,
    /// then any configured extras.
    pub fn allowed_origins(&self) -> Vec<String> {
        let mut origins: Vec<String> = Vec::new();
        let candidates = STATIC_ALLOWED_ORIGINS
            .iter()
            .map(|o| o.to_string())
            .chain(self.cors.extra_origins.iter().cloned());

        for origin in candidates {
            let origin = origin.trim_end_matches('/').to_string();
            if !origin.is_empty() && !origins.contains(&origin) {
                origins.push(origin);
            }
        }
        origins
    }

    /// Address the listener binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.listener.host, self.listener.port)
    }
}

/// Deployment mode, read from `NODE_ENV`.
///
/// Only an explicit `development` enables development behaviour. An unset or
/// unrecognised value is [`Environment::Unspecified`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Production,
    Development,
    Test,
    #[default]
    Unspecified,
}

impl Environment {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "development" | "dev" => Environment::Development,
            "test" => Environment::Test,
            _ => Environment::Unspecified,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Production => "production",
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Unspecified => "unspecified",
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// Port to listen on.
    pub port: u16,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// Cross-origin policy configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CorsConfig {
    /// Origins allowed in addition to the static ones (e.g., `FRONTEND_URL`).
    pub extra_origins: Vec<String>,

    /// Allow any origin. Only honoured outside production.
    pub permissive: bool,
}

/// Body decoding configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BodyConfig {
    /// Maximum accepted request body size in bytes.
    pub limit_bytes: usize,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            limit_bytes: 100 * 1024,
        }
    }
}

/// Data store connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Connection URL (e.g., "postgres://user:pass@db:5432/app").
    pub url: Option<String>,

    /// Ping timeout in milliseconds.
    pub ping_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            ping_timeout_ms: 2_000,
        }
    }
}

/// Bootstrap configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Run bootstrap before listening.
    pub enabled: bool,

    /// Give up on bootstrap after this many seconds.
    pub timeout_secs: u64,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: 10,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log format; defaults to json in production and pretty elsewhere.
    pub log_format: Option<LogFormat>,

    /// Interval between metrics exporter upkeep runs.
    pub upkeep_interval_secs: u64,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: None,
            upkeep_interval_secs: 5,
        }
    }
}

/// API documentation configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DocsConfig {
    /// Path to a generated OpenAPI document. A built-in document is served
    /// when unset.
    pub spec_path: Option<String>,
}
