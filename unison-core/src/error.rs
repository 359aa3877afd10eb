//! Error types.

use thiserror::Error;

/// Error produced by a fallible dispatch target.
pub type TargetError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// One failed invocation during a dispatch fan-out.
#[derive(Debug, Error)]
#[error("dispatch target #{index} failed: {source}")]
pub struct TargetFailure {
    /// Position of the target in the fan-out order. The store dispatch, when
    /// captured, comes after every registered target.
    pub index: usize,

    #[source]
    pub source: TargetError,
}

#[derive(Debug, Error)]
pub enum Error {
    /// A store hook ran without an active store scope.
    ///
    /// This is a wiring mistake at the call site and is never retried.
    #[error("no store scope is active; enter a StoreScope before using store hooks")]
    MissingStore,

    /// One or more dispatch targets failed. Every other target, and the
    /// store dispatch, still ran.
    #[error("{} of {attempted} dispatch targets failed", .failures.len())]
    Dispatch {
        attempted: usize,
        failures: Vec<TargetFailure>,
    },
}
