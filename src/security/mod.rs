//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → headers.rs (response gets the protective baseline, always)
//!     → cors.rs (origin allow/deny, preflight short-circuit)
//!     → Pass to body decoding and routing
//! ```
//!
//! # Design Decisions
//! - Header baseline is outermost so error responses carry it too
//! - Fail closed: an unlisted origin is denied unless permissive mode is on

pub mod cors;
pub mod headers;

pub use cors::{cors_middleware, OriginDecision, OriginPolicy};
pub use headers::security_headers_middleware;
