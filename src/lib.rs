//! Request entry layer for a backend service.
//!
//! Decides, for every inbound HTTP request, which cross-cutting policies
//! apply before it reaches application route groups, and governs how the
//! process starts and fails.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ security headers ──▶ metrics ──▶ cors ──▶ body ──▶ router ──▶ route groups
//!                                                                   │
//!                                   error funnel ◀──────────────────┘ (any failure)
//!
//!   Process: config → logging → bootstrap (tolerated) → listen → serve
//!            background fault ──▶ log ──▶ exit 1
//! ```

// Core subsystems
pub mod config;
pub mod http;
pub mod routing;

// Dependencies
pub mod health;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::ServiceConfig;
pub use http::{ApiError, AppState, HttpServer};
pub use lifecycle::Shutdown;
