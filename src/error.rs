//! Error types shared by the scheduler, the effect adapter and renderers.

use std::any::Any;
use std::io;

use thiserror::Error;

/// Failures that can surface from a render job or a patch.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The renderer could not reconcile the new tree.
    #[error("patch failed: {0}")]
    Patch(String),

    /// A job panicked while running. The payload message is kept when it is a string.
    #[error("job panicked: {0}")]
    JobPanicked(String),

    /// A job kept re-queueing itself across consecutive flushes.
    #[error("job exceeded the recursion limit of {limit} consecutive flushes")]
    RecursionLimit { limit: usize },

    /// A tracked effect was created but its first run did not happen.
    #[error("effect did not run synchronously on creation")]
    EffectNotRun,

    /// Output could not be written.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl RuntimeError {
    /// Build a `JobPanicked` error from a `catch_unwind` payload.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        RuntimeError::JobPanicked(message)
    }
}

/// One or more jobs failed during a microtask flush.
#[derive(Debug, Error)]
#[error("{} job(s) failed during flush", .failures.len())]
pub struct FlushError {
    pub failures: Vec<RuntimeError>,
}
