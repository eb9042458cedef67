//! Startup orchestration.
//!
//! # States
//! ```text
//! NotStarted → BootstrapRunning → BootstrapOk ─────┐
//!                              └→ BootstrapFailed ─┴→ Listening
//! ```
//!
//! # Design Decisions
//! - Bootstrap runs exactly once, before the listener binds
//! - A failed or timed-out bootstrap is logged and startup continues
//! - A bind failure is fatal
//! - Listening is terminal

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::BootstrapConfig;
use crate::health::store::{DataStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupState {
    NotStarted,
    BootstrapRunning,
    BootstrapFailed,
    BootstrapOk,
    Listening,
}

impl StartupState {
    fn can_transition_to(self, next: StartupState) -> bool {
        use StartupState::*;
        matches!(
            (self, next),
            (NotStarted, BootstrapRunning)
                | (BootstrapRunning, BootstrapOk)
                | (BootstrapRunning, BootstrapFailed)
                | (BootstrapOk, Listening)
                | (BootstrapFailed, Listening)
        )
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("data store error: {0}")]
    Store(#[from] StoreError),

    #[error("bootstrap timed out after {0} seconds")]
    Timeout(u64),

    #[error("{0}")]
    Failed(String),
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid startup transition from {from:?} to {to:?}")]
    InvalidTransition { from: StartupState, to: StartupState },
}

/// One-time, idempotent setup run before traffic is accepted.
#[async_trait]
pub trait Bootstrap: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, store: &dyn DataStore) -> Result<(), BootstrapError>;
}

/// Verifies the data store answers before the service starts listening.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnsureStoreReachable;

#[async_trait]
impl Bootstrap for EnsureStoreReachable {
    fn name(&self) -> &str {
        "ensure-store-reachable"
    }

    async fn run(&self, store: &dyn DataStore) -> Result<(), BootstrapError> {
        store.ping().await?;
        Ok(())
    }
}

/// Drives the startup state machine.
#[derive(Debug)]
pub struct StartupSequencer {
    state: StartupState,
    history: Vec<StartupState>,
    config: BootstrapConfig,
    bootstrap_error: Option<String>,
}

impl StartupSequencer {
    pub fn new(config: BootstrapConfig) -> Self {
        Self {
            state: StartupState::NotStarted,
            history: vec![StartupState::NotStarted],
            config,
            bootstrap_error: None,
        }
    }

    pub fn state(&self) -> StartupState {
        self.state
    }

    /// Every state visited so far, in order.
    pub fn history(&self) -> &[StartupState] {
        &self.history
    }

    /// Message of the bootstrap failure, if bootstrap failed.
    pub fn bootstrap_error(&self) -> Option<&str> {
        self.bootstrap_error.as_deref()
    }

    /// Outcome label for metrics.
    pub fn outcome(&self) -> &'static str {
        if !self.config.enabled {
            "skipped"
        } else if self.bootstrap_error.is_some() {
            "failed"
        } else {
            "ok"
        }
    }

    fn transition(&mut self, next: StartupState) -> Result<(), StartupError> {
        if !self.state.can_transition_to(next) {
            return Err(StartupError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::debug!(from = ?self.state, to = ?next, "Startup state transition");
        self.state = next;
        self.history.push(next);
        Ok(())
    }

    /// Run bootstrap once. Never fails the startup on bootstrap errors.
    pub async fn run_bootstrap(
        &mut self,
        bootstrap: &dyn Bootstrap,
        store: &dyn DataStore,
    ) -> Result<(), StartupError> {
        self.transition(StartupState::BootstrapRunning)?;

        if !self.config.enabled {
            tracing::info!(bootstrap = bootstrap.name(), "Bootstrap disabled, skipping");
            return self.transition(StartupState::BootstrapOk);
        }

        tracing::info!(bootstrap = bootstrap.name(), "Bootstrap starting");
        let timeout = Duration::from_secs(self.config.timeout_secs);
        let result = match tokio::time::timeout(timeout, bootstrap.run(store)).await {
            Ok(result) => result,
            Err(_) => Err(BootstrapError::Timeout(self.config.timeout_secs)),
        };

        match result {
            Ok(()) => {
                tracing::info!(bootstrap = bootstrap.name(), "Bootstrap complete");
                self.transition(StartupState::BootstrapOk)
            }
            Err(e) => {
                tracing::error!(
                    bootstrap = bootstrap.name(),
                    error = %e,
                    detail = ?e,
                    "Bootstrap failed, continuing startup"
                );
                self.bootstrap_error = Some(e.to_string());
                self.transition(StartupState::BootstrapFailed)
            }
        }
    }

    /// Bind the listener. Must follow [`run_bootstrap`](Self::run_bootstrap).
    pub async fn listen(&mut self, address: &str) -> Result<TcpListener, StartupError> {
        if !self.state.can_transition_to(StartupState::Listening) {
            return Err(StartupError::InvalidTransition {
                from: self.state,
                to: StartupState::Listening,
            });
        }

        let listener = TcpListener::bind(address)
            .await
            .map_err(|source| StartupError::Bind {
                address: address.to_string(),
                source,
            })?;

        self.transition(StartupState::Listening)?;
        Ok(listener)
    }

    /// Full sequence: bootstrap, then bind.
    pub async fn start(
        &mut self,
        bootstrap: &dyn Bootstrap,
        store: &dyn DataStore,
        address: &str,
    ) -> Result<TcpListener, StartupError> {
        self.run_bootstrap(bootstrap, store).await?;
        self.listen(address).await
    }
}
