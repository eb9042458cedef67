//! Route group registration.
//!
//! # Responsibilities
//! - Accept route groups at startup, in order
//! - Reject groups whose mount prefixes overlap
//! - Mount every group under `/api`
//!
//! # Design Decisions
//! - Immutable after the router is built
//! - Prefix comparison is per path segment (`/users` does not overlap `/users2`)
//! - Explicit error rather than axum's panic on conflicting nests

use axum::Router;
use thiserror::Error;

use crate::http::server::AppState;

/// Mount point for every route group.
pub const API_PREFIX: &str = "/api";

/// A set of application routes owned by one collaborator.
pub trait RouteGroup: Send + Sync {
    /// Name for logs.
    fn name(&self) -> &str;

    /// Mount prefix below [`API_PREFIX`], e.g. `/users`.
    fn prefix(&self) -> &str;

    /// The group's routes, relative to its prefix.
    fn router(&self) -> Router<AppState>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("route group {name:?} has invalid prefix {prefix:?}")]
    InvalidPrefix { name: String, prefix: String },

    #[error("route group {name:?} prefix {prefix:?} overlaps group {existing:?}")]
    Overlap {
        name: String,
        prefix: String,
        existing: String,
    },
}

/// Ordered table of route groups.
#[derive(Default)]
pub struct RouteRegistry {
    groups: Vec<Box<dyn RouteGroup>>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<G>(&mut self, group: G) -> Result<&mut Self, RegistryError>
    where
        G: RouteGroup + 'static,
    {
        let prefix = group.prefix();
        if !is_valid_prefix(prefix) {
            return Err(RegistryError::InvalidPrefix {
                name: group.name().to_string(),
                prefix: prefix.to_string(),
            });
        }

        if let Some(existing) = self
            .groups
            .iter()
            .find(|g| prefixes_overlap(g.prefix(), prefix))
        {
            return Err(RegistryError::Overlap {
                name: group.name().to_string(),
                prefix: prefix.to_string(),
                existing: existing.name().to_string(),
            });
        }

        tracing::debug!(group = group.name(), prefix = prefix, "Route group registered");
        self.groups.push(Box::new(group));
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Mount paths in registration order.
    pub fn mount_paths(&self) -> Vec<String> {
        self.groups
            .iter()
            .map(|g| format!("{API_PREFIX}{}", g.prefix()))
            .collect()
    }

    /// Build one router with every group nested under its mount path.
    pub fn to_router(&self) -> Router<AppState> {
        self.groups
            .iter()
            .fold(Router::new(), |router, group| {
                router.nest(&format!("{API_PREFIX}{}", group.prefix()), group.router())
            })
    }
}

/// Non-empty, starts with `/`, no trailing `/`, no wildcards or captures.
fn is_valid_prefix(prefix: &str) -> bool {
    prefix.len() > 1
        && prefix.starts_with('/')
        && !prefix.ends_with('/')
        && !prefix.contains(['{', '}', '*', ':'])
        && !prefix.contains("//")
}

fn prefixes_overlap(a: &str, b: &str) -> bool {
    let a: Vec<&str> = a.split('/').filter(|s| !s.is_empty()).collect();
    let b: Vec<&str> = b.split('/').filter(|s| !s.is_empty()).collect();
    a.iter().zip(b.iter()).all(|(x, y)| x == y)
}
