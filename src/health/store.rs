//! Data store contract and the TCP reachability check.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::net::TcpStream;
use url::Url;

use crate::config::StoreConfig;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("data store is not configured")]
    NotConfigured,

    #[error("invalid data store url: {0}")]
    InvalidUrl(String),

    #[error("data store ping timed out after {0} ms")]
    Timeout(u64),

    #[error("data store unreachable: {0}")]
    Unreachable(#[from] std::io::Error),

    #[error("{0}")]
    Query(String),
}

/// What the service needs from its data store client.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Issue one trivial liveness check.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Pings the store by opening a TCP connection to the host and port in
/// the configured URL.
#[derive(Debug, Clone)]
pub struct TcpDataStore {
    target: Option<(String, u16)>,
    timeout: Duration,
}

impl TcpDataStore {
    pub fn from_config(config: &StoreConfig) -> Result<Self, StoreError> {
        let target = match &config.url {
            Some(raw) => Some(parse_target(raw)?),
            None => None,
        };

        Ok(Self {
            target,
            timeout: Duration::from_millis(config.ping_timeout_ms),
        })
    }

    pub fn target(&self) -> Option<(&str, u16)> {
        self.target.as_ref().map(|(h, p)| (h.as_str(), *p))
    }
}

#[async_trait]
impl DataStore for TcpDataStore {
    async fn ping(&self) -> Result<(), StoreError> {
        let (host, port) = self.target.as_ref().ok_or(StoreError::NotConfigured)?;

        match tokio::time::timeout(self.timeout, TcpStream::connect((host.as_str(), *port))).await {
            Ok(Ok(_stream)) => Ok(()),
            Ok(Err(e)) => Err(StoreError::Unreachable(e)),
            Err(_) => Err(StoreError::Timeout(self.timeout.as_millis() as u64)),
        }
    }
}

fn parse_target(raw: &str) -> Result<(String, u16), StoreError> {
    let url = Url::parse(raw).map_err(|_| StoreError::InvalidUrl(raw.to_string()))?;
    let host = url
        .host_str()
        .ok_or_else(|| StoreError::InvalidUrl(raw.to_string()))?
        .trim_start_matches('[')
        .trim_end_matches(']')
        .to_string();

    let port = url
        .port()
        .or_else(|| default_port(url.scheme()))
        .or_else(|| url.port_or_known_default())
        .ok_or_else(|| StoreError::InvalidUrl(raw.to_string()))?;

    Ok((host, port))
}

fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "postgres" | "postgresql" => Some(5432),
        "mysql" | "mariadb" => Some(3306),
        "mongodb" => Some(27017),
        "redis" | "rediss" => Some(6379),
        "sqlserver" => Some(1433),
        _ => None,
    }
}
