//! The [`BlobStore`] and [`BlobSession`] traits defining the storage engine
//! interface.
//!
//! Any backend (in-memory, file-backed, flash NVS) implements these traits
//! to provide namespaced key→bytes persistence for the PAL above it.

use crate::error::StoreResult;

/// Access mode for an open session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpenMode {
    /// Reads only. Opening a namespace that was never written fails with
    /// `NamespaceMissing`.
    ReadOnly,
    /// Reads and writes. Opening creates the namespace if needed.
    ReadWrite,
}

/// Namespaced persistent blob storage engine.
///
/// All implementations must satisfy these invariants:
/// - Blobs are durable after a session's `commit` returns.
/// - Concurrent sessions are safe; concurrent commits to the same key
///   resolve last-writer-wins.
/// - The engine never interprets blob contents — it is a pure key-value
///   store.
/// - "Not found" is reported distinctly from I/O failure, never conflated.
pub trait BlobStore: Send + Sync {
    /// One-time partition initialization: open or create the backing
    /// partition and verify its format version.
    ///
    /// Must be idempotent. A version-mismatched partition is erased and
    /// recreated; failure here means the engine is unusable.
    fn init_partition(&self) -> StoreResult<()>;

    /// Open a session on `namespace` in the given mode.
    ///
    /// Dropping the returned session closes it; writes staged through a
    /// read-write session are discarded unless `commit` was called.
    fn open<'a>(&'a self, namespace: &str, mode: OpenMode)
        -> StoreResult<Box<dyn BlobSession + 'a>>;
}

/// An open handle on one namespace.
pub trait BlobSession {
    /// Size in bytes of the blob stored under `key`.
    ///
    /// Returns `NotFound` if no blob exists under the key.
    fn size_of(&self, key: &str) -> StoreResult<usize>;

    /// Append the blob stored under `key` onto `buf`.
    ///
    /// The caller sizes `buf` beforehand (via [`size_of`]) so that the
    /// allocation is under its control.
    ///
    /// [`size_of`]: BlobSession::size_of
    fn read_into(&self, key: &str, buf: &mut Vec<u8>) -> StoreResult<()>;

    /// Stage a write of `value` under `key`, replacing any prior blob.
    ///
    /// Staged writes become visible and durable only at `commit`.
    /// Fails with `ReadOnly` on a read-only session.
    fn set(&mut self, key: &str, value: &[u8]) -> StoreResult<()>;

    /// Publish all staged writes.
    fn commit(&mut self) -> StoreResult<()>;
}
