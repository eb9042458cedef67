//! Fault escalation for background work.
//!
//! Background tasks are spawned through [`FaultEscalation::spawn`]. A task
//! that returns an error or panics is reported on the fault channel;
//! `main` logs it and exits the process with [`FAULT_EXIT_CODE`].

use std::any::Any;
use std::fmt;
use std::future::Future;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub const FAULT_EXIT_CODE: i32 = 1;

/// A failure nobody else handled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Fault {
    #[error("background task {task} failed: {error}")]
    TaskFailed {
        task: String,
        error: String,
        detail: String,
    },

    #[error("background task {task} panicked: {message}")]
    TaskPanicked { task: String, message: String },
}

/// Spawns supervised tasks and forwards their faults.
#[derive(Debug, Clone)]
pub struct FaultEscalation {
    tx: mpsc::UnboundedSender<Fault>,
}

/// Receiving side of the fault channel, owned by `main`.
#[derive(Debug)]
pub struct FaultReceiver {
    rx: mpsc::UnboundedReceiver<Fault>,
}

impl FaultEscalation {
    pub fn new() -> (Self, FaultReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, FaultReceiver { rx })
    }

    /// Spawn `future` and escalate if it fails or panics.
    pub fn spawn<F, E>(&self, task: &'static str, future: F) -> JoinHandle<()>
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: fmt::Display + fmt::Debug + Send + 'static,
    {
        let inner = tokio::spawn(future);
        let tx = self.tx.clone();

        tokio::spawn(async move {
            let fault = match inner.await {
                Ok(Ok(())) => return,
                Ok(Err(e)) => Fault::TaskFailed {
                    task: task.to_string(),
                    error: e.to_string(),
                    detail: format!("{e:?}"),
                },
                Err(join_err) if join_err.is_panic() => Fault::TaskPanicked {
                    task: task.to_string(),
                    message: panic_message(join_err.into_panic().as_ref()),
                },
                Err(_) => {
                    tracing::debug!(task, "Background task cancelled");
                    return;
                }
            };

            if tx.send(fault).is_err() {
                tracing::error!(task, "Fault channel closed, fault dropped");
            }
        })
    }
}

impl FaultReceiver {
    /// Wait for the next fault. Pending forever once every sender is gone.
    pub async fn next(&mut self) -> Fault {
        match self.rx.recv().await {
            Some(fault) => fault,
            None => std::future::pending().await,
        }
    }
}

/// Log `fault` with full detail and return the exit code to use.
pub fn escalate(fault: &Fault) -> i32 {
    tracing::error!(
        fault = %fault,
        detail = ?fault,
        exit_code = FAULT_EXIT_CODE,
        "UNHANDLED FAULT! Shutting down"
    );
    FAULT_EXIT_CODE
}

/// Route panics from any thread through tracing, with a backtrace.
///
/// Logging only. A panic escalates to an exit only when it happens inside a
/// task started with [`FaultEscalation::spawn`]; handler panics become 500
/// responses and other unsupervised tasks just end.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::force_capture();
        tracing::error!(
            panic = %info,
            backtrace = %backtrace,
            "Panic"
        );
    }));
}

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}
