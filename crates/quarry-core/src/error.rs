//! Error types for sessions and controller handles.

use thiserror::Error;

use crate::id::Side;

/// Errors reported by a [`Session`](crate::Session) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// A serialized state could not be parsed back into a session.
    #[error("malformed session state: {detail}")]
    MalformedState {
        /// Human-readable description of what went wrong.
        detail: String,
    },
}

/// Errors from the lifecycle of an asynchronous controller handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    /// `start()` was called on a handle that is already running.
    #[error("{side} controller was already started")]
    AlreadyStarted {
        /// Side owning the handle.
        side: Side,
    },
    /// The handle was used after `terminate()`.
    #[error("{side} controller has been terminated")]
    Terminated {
        /// Side owning the handle.
        side: Side,
    },
    /// The worker thread could not be spawned.
    #[error("failed to spawn {side} controller thread: {reason}")]
    SpawnFailed {
        /// Side owning the handle.
        side: Side,
        /// The underlying OS error, rendered.
        reason: String,
    },
}
