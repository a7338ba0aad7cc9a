//! Error types for blob storage operations.

use thiserror::Error;

/// Errors from the blob storage engine.
///
/// "Not found" conditions (`NotFound`, `NamespaceMissing`) are deliberately
/// distinct from I/O faults so that callers can treat an absent key as an
/// expected outcome rather than a failure.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No blob is stored under this key.
    #[error("blob not found: {key}")]
    NotFound { key: String },

    /// The namespace has never been created (no key was ever committed).
    #[error("namespace does not exist: {namespace}")]
    NamespaceMissing { namespace: String },

    /// Write attempted through a read-only session.
    #[error("session is read-only")]
    ReadOnly,

    /// The partition's on-disk metadata is unreadable or malformed.
    #[error("partition corrupt: {0}")]
    Corrupt(String),

    /// I/O error from the underlying storage medium.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
