//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route groups (at startup):
//!     RouteGroup impls
//!     → registry.rs (validate prefixes, keep order)
//!     → nested under /api in one axum Router
//!
//! Fixed mounts:
//!     /health, /metrics, /documentation (docs.rs)
//!
//! Incoming request:
//!     → first matching route wins
//!     → no match → NotFound into the error funnel
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Groups own disjoint prefixes, so registration order never changes a match
//! - Handlers return errors; they never write error responses themselves

pub mod docs;
pub mod meta;
pub mod registry;

pub use docs::ApiDocument;
pub use meta::MetaRoutes;
pub use registry::{RegistryError, RouteGroup, RouteRegistry, API_PREFIX};
