//! The object-store facade: save, find, get-value, release, destroy.

use std::sync::Arc;

use p11_store::{BlobStore, OpenMode, StoreError};
use tracing::{debug, error};
use zeroize::Zeroize;

use crate::config::PalConfig;
use crate::error::{PalError, PalResult};
use crate::handle::ObjectHandle;
use crate::init::NamespaceGuard;
use crate::labels::LabelTable;

/// An object's bytes fetched from storage, plus its privacy
/// classification.
///
/// Owns its buffer; the contents are zeroized when the value is dropped.
/// Callers written against the manual-ownership token contract release it
/// through [`release_object_value`]; plain `drop` is equivalent.
pub struct ObjectValue {
    data: Vec<u8>,
    private: bool,
}

impl ObjectValue {
    /// The stored bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Length of the stored bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the value holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether the object is sensitive key material (as opposed to an
    /// exportable certificate or public key).
    pub fn is_private(&self) -> bool {
        self.private
    }
}

impl Drop for ObjectValue {
    fn drop(&mut self) {
        self.data.zeroize();
    }
}

impl std::fmt::Debug for ObjectValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the bytes; they may be key material.
        f.debug_struct("ObjectValue")
            .field("len", &self.data.len())
            .field("private", &self.private)
            .finish()
    }
}

/// Release a value obtained from [`TokenPal::get_object_value`].
///
/// Retained for API-contract symmetry with callers written against the
/// manual-ownership contract; dropping the value has the same effect.
/// A no-op (not a fault) on an empty value.
pub fn release_object_value(value: ObjectValue) {
    drop(value);
}

/// Label-addressed persistent object store for token objects.
///
/// Each recognized label maps to one of a closed set of storage slots; the
/// PAL persists, retrieves and securely erases opaque blobs for those
/// slots through a [`BlobStore`] engine. Safe for concurrent use: the only
/// lock this layer takes is around one-time partition initialization, and
/// ordinary operations rely on the engine's own concurrency guarantees
/// (last-writer-wins on same-slot saves).
pub struct TokenPal {
    store: Arc<dyn BlobStore>,
    namespace: String,
    labels: LabelTable,
    guard: NamespaceGuard,
}

impl TokenPal {
    /// Create a PAL over `store` with the given configuration.
    ///
    /// Fails with `InvalidConfig` if the label spellings are unusable
    /// (empty, or one a prefix of another). No storage I/O happens here;
    /// the partition is initialized lazily on first use or eagerly via
    /// [`initialize`].
    ///
    /// [`initialize`]: TokenPal::initialize
    pub fn new(store: Arc<dyn BlobStore>, config: PalConfig) -> PalResult<Self> {
        let labels = LabelTable::new(&config.labels)?;
        Ok(Self {
            store,
            namespace: config.namespace,
            labels,
            guard: NamespaceGuard::new(),
        })
    }

    /// Eagerly run the one-time partition initialization.
    ///
    /// Optional: every other entry point initializes lazily. Calling this
    /// at startup surfaces fatal storage conditions before first use.
    pub fn initialize(&self) -> PalResult<()> {
        self.guard.ensure_ready(self.store.as_ref())
    }

    /// Persist `data` under the slot addressed by `label`.
    ///
    /// An unrecognized label returns `Ok(ObjectHandle::Invalid)` without
    /// touching storage. Otherwise the blob unconditionally replaces any
    /// prior content of the slot and the slot's handle is returned.
    pub fn save_object(&self, label: &[u8], data: &[u8]) -> PalResult<ObjectHandle> {
        self.guard.ensure_ready(self.store.as_ref())?;

        let Some(entry) = self.labels.resolve(label) else {
            return Ok(ObjectHandle::Invalid);
        };

        debug!(key = entry.storage_key, len = data.len(), "writing object");
        let mut session = self
            .store
            .open(&self.namespace, OpenMode::ReadWrite)
            .map_err(|e| {
                error!(error = %e, "storage open failed");
                PalError::OperationFailed(e)
            })?;
        session.set(entry.storage_key, data).map_err(|e| {
            error!(error = %e, key = entry.storage_key, "blob write failed");
            PalError::OperationFailed(e)
        })?;
        session.commit().map_err(|e| {
            error!(error = %e, key = entry.storage_key, "commit failed");
            PalError::OperationFailed(e)
        })?;

        Ok(entry.handle)
    }

    /// Translate `label` into the handle of a currently present object.
    ///
    /// Returns `Ok(ObjectHandle::Invalid)` when the label is unrecognized,
    /// the slot was never written, or the slot holds a destroyed
    /// placeholder. The placeholder check inspects only the first byte of
    /// the blob: an object format whose first content byte is legitimately
    /// 0x00 would be misreported as destroyed. The supported formats (DER
    /// certificates, the key-pair blob) never begin with 0x00.
    pub fn find_object(&self, label: &[u8]) -> PalResult<ObjectHandle> {
        self.guard.ensure_ready(self.store.as_ref())?;

        let Some(entry) = self.labels.resolve(label) else {
            return Ok(ObjectHandle::Invalid);
        };

        // Size probe first: an absent namespace or key, or a zero-length
        // blob, means no object without fetching anything.
        let session = match self.store.open(&self.namespace, OpenMode::ReadOnly) {
            Ok(session) => session,
            Err(e) => {
                // Nothing stored yet is the common case here.
                debug!(error = %e, "storage open failed during find");
                return Ok(ObjectHandle::Invalid);
            }
        };
        match session.size_of(entry.storage_key) {
            Ok(0) | Err(_) => return Ok(ObjectHandle::Invalid),
            Ok(_) => {}
        }
        drop(session);

        // Full fetch for the destroyed-placeholder check.
        match self.get_object_value(entry.handle) {
            Ok(value) => {
                let destroyed = value.bytes().first() == Some(&0x00);
                release_object_value(value);
                if destroyed {
                    Ok(ObjectHandle::Invalid)
                } else {
                    Ok(entry.handle)
                }
            }
            Err(_) => Ok(ObjectHandle::Invalid),
        }
    }

    /// Fetch the bytes stored for `handle`, with its privacy flag.
    ///
    /// The returned [`ObjectValue`] owns its buffer; each successful call
    /// pairs with exactly one [`release_object_value`] (or drop). An
    /// unknown handle or an absent/empty slot is `InvalidHandle`; engine
    /// faults surface as `OperationFailed`.
    pub fn get_object_value(&self, handle: ObjectHandle) -> PalResult<ObjectValue> {
        self.guard.ensure_ready(self.store.as_ref())?;

        let Some(slot) = handle.slot() else {
            return Err(PalError::InvalidHandle);
        };

        debug!(key = slot.storage_key, "reading object");
        let session = match self.store.open(&self.namespace, OpenMode::ReadOnly) {
            Ok(session) => session,
            Err(StoreError::NamespaceMissing { .. }) => {
                // Namespace not created yet, so no objects are stored.
                return Err(PalError::InvalidHandle);
            }
            Err(e) => {
                error!(error = %e, "storage open failed");
                return Err(PalError::OperationFailed(e));
            }
        };

        let len = match session.size_of(slot.storage_key) {
            Ok(0) | Err(StoreError::NotFound { .. }) => {
                return Err(PalError::InvalidHandle)
            }
            Ok(len) => len,
            Err(e) => {
                error!(error = %e, key = slot.storage_key, "blob size query failed");
                return Err(PalError::OperationFailed(e));
            }
        };

        // Size the buffer exactly; allocation failure is reported rather
        // than aborting.
        let mut data = Vec::new();
        data.try_reserve_exact(len)?;
        if let Err(e) = session.read_into(slot.storage_key, &mut data) {
            data.zeroize();
            error!(error = %e, key = slot.storage_key, "blob read failed");
            return Err(PalError::OperationFailed(e));
        }

        Ok(ObjectValue {
            data,
            private: slot.private,
        })
    }

    /// Securely erase the object addressed by `handle`.
    ///
    /// The slot is overwritten with an all-zero blob of the same length
    /// as the current content, never deleted: the engine's delete
    /// semantics under power loss are unspecified, and find() relies on a
    /// same-size placeholder remaining present. Destroying an already
    /// destroyed slot succeeds and leaves it zeroed.
    pub fn destroy_object(&self, handle: ObjectHandle) -> PalResult<()> {
        let Some(entry) = self.labels.entry_for(handle) else {
            return Err(PalError::InvalidHandle);
        };

        let value = self.get_object_value(handle)?;

        let mut zeroed = Vec::new();
        zeroed.try_reserve(value.len())?;
        zeroed.resize(value.len(), 0u8);

        debug!(handle = %handle, len = value.len(), "overwriting object with zeroed placeholder");
        let resaved = self.save_object(entry.label(), &zeroed)?;
        if resaved != handle {
            // The label and handle tables disagree about this slot.
            return Err(PalError::General(format!(
                "destroy re-save returned {resaved}, expected {handle}"
            )));
        }

        release_object_value(value);
        Ok(())
    }
}

impl std::fmt::Debug for TokenPal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPal")
            .field("namespace", &self.namespace)
            .finish()
    }
}
