//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Bootstrap (failure tolerated) → Bind listener
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     SIGTERM/SIGINT → Stop accepting → Drain in-flight requests → Exit 0
//!
//! Escalation (escalation.rs):
//!     Background task error/panic → Log with detail → Exit 1
//! ```
//!
//! # Design Decisions
//! - Listener binds last (traffic only after bootstrap was attempted)
//! - Nothing but the escalation path terminates the process on a fault

pub mod escalation;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use escalation::{escalate, install_panic_hook, Fault, FaultEscalation, FaultReceiver};
pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
pub use startup::{
    Bootstrap, BootstrapError, EnsureStoreReachable, StartupError, StartupSequencer, StartupState,
};
