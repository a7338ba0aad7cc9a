//! Namespaced key-value blob storage beneath the PKCS#11 PAL.
//!
//! This crate is the storage-engine seam of the token stack: a namespaced
//! key→bytes store with explicit open/commit/close session semantics,
//! mirroring the contract of embedded NVS engines. The PAL above it never
//! talks to a concrete backend; it holds a [`BlobStore`] trait object.
//!
//! # Backends
//!
//! - [`InMemoryBlobStore`] — `HashMap`-based store for tests and embedding
//! - [`FileBlobStore`] — one file per blob under a namespace directory,
//!   with a partition format-version marker
//!
//! # Design Rules
//!
//! 1. Blobs are opaque. The engine never interprets their contents.
//! 2. Writes staged in a session become durable only at `commit`.
//! 3. "Not found" is reported distinctly from I/O failure.
//! 4. Concurrent sessions are safe; same-key commits are last-writer-wins.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod file;
pub mod memory;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{StoreError, StoreResult};
pub use file::FileBlobStore;
pub use memory::InMemoryBlobStore;
pub use traits::{BlobSession, BlobStore, OpenMode};
