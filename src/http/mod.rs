//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware order)
//!     → body.rs (JSON decoding into the request context)
//!     → [routing: fixed routes and route groups]
//!     → error.rs / funnel.rs (every failure becomes one error envelope)
//!     → Send to client
//! ```

pub mod body;
pub mod context;
pub mod error;
pub mod funnel;
pub mod server;

pub use context::{JsonBody, RouteTemplate};
pub use error::ApiError;
pub use funnel::{funnel, ErrorEnvelope};
pub use server::{build_router, AppState, HttpServer};
