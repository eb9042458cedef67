//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! GET /health
//!     → reporter.rs (handler)
//!     → store.rs (DataStore::ping, one ping per request)
//!     → 200 {"status":"ok"} | 503 {"status":"error","detail":...}
//! ```
//!
//! # Design Decisions
//! - No caching: every request pings again
//! - Ping faults are reported, never propagated

pub mod reporter;
pub mod store;

pub use reporter::{check, health_handler, HealthResult, HealthStatus};
pub use store::{DataStore, StoreError, TcpDataStore};
