//! Error types for PAL operations.

use std::collections::TryReserveError;

use p11_store::StoreError;
use thiserror::Error;

/// Errors that can occur during PAL operations.
///
/// `InvalidHandle` is an expected, non-fatal outcome (unresolved label or
/// unknown handle). `Fatal` means the one-time storage initialization
/// failed; it is not recoverable by retrying at this layer.
#[derive(Debug, Error)]
pub enum PalError {
    /// The label did not resolve, or the handle names no known slot.
    #[error("invalid object handle")]
    InvalidHandle,

    /// Buffer allocation failed.
    #[error("out of memory: {0}")]
    OutOfMemory(#[from] TryReserveError),

    /// The storage engine failed during a read or write (distinct from
    /// "not found").
    #[error("storage operation failed: {0}")]
    OperationFailed(#[source] StoreError),

    /// A post-condition was violated; indicates drift between the label
    /// and handle tables, not a caller mistake.
    #[error("post-condition violated: {0}")]
    General(String),

    /// One-time storage initialization failed. Every subsequent call
    /// returns this same condition without retrying.
    #[error("token storage initialization failed: {0}")]
    Fatal(String),

    /// The supplied configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Convenience type alias for PAL operations.
pub type PalResult<T> = std::result::Result<T, PalError>;
