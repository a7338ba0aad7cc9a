use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::traits::{BlobSession, BlobStore, OpenMode};

/// In-memory, HashMap-based blob store.
///
/// Intended for tests and embedding. Namespaces and blobs are held in
/// memory behind a `RwLock` for safe concurrent access. Nothing is durable
/// across process restarts.
pub struct InMemoryBlobStore {
    /// namespace → (key → blob).
    namespaces: RwLock<HashMap<String, HashMap<String, Vec<u8>>>>,
    /// Number of times `init_partition` has run, observable by tests
    /// asserting the exactly-once initialization property.
    init_events: AtomicUsize,
}

impl InMemoryBlobStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            namespaces: RwLock::new(HashMap::new()),
            init_events: AtomicUsize::new(0),
        }
    }

    /// Number of partition-initialization events so far.
    pub fn init_count(&self) -> usize {
        self.init_events.load(Ordering::SeqCst)
    }

    /// Number of committed blobs in `namespace` (0 if it does not exist).
    pub fn namespace_len(&self, namespace: &str) -> usize {
        self.namespaces
            .read()
            .expect("lock poisoned")
            .get(namespace)
            .map_or(0, HashMap::len)
    }

    /// Committed blob under `namespace`/`key`, if any. Test helper.
    pub fn committed(&self, namespace: &str, key: &str) -> Option<Vec<u8>> {
        self.namespaces
            .read()
            .expect("lock poisoned")
            .get(namespace)
            .and_then(|ns| ns.get(key))
            .cloned()
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobStore for InMemoryBlobStore {
    fn init_partition(&self) -> StoreResult<()> {
        self.init_events.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn open<'a>(
        &'a self,
        namespace: &str,
        mode: OpenMode,
    ) -> StoreResult<Box<dyn BlobSession + 'a>> {
        match mode {
            OpenMode::ReadOnly => {
                let map = self.namespaces.read().expect("lock poisoned");
                if !map.contains_key(namespace) {
                    return Err(StoreError::NamespaceMissing {
                        namespace: namespace.to_string(),
                    });
                }
            }
            OpenMode::ReadWrite => {
                let mut map = self.namespaces.write().expect("lock poisoned");
                map.entry(namespace.to_string()).or_default();
            }
        }

        Ok(Box::new(MemorySession {
            store: self,
            namespace: namespace.to_string(),
            mode,
            pending: HashMap::new(),
        }))
    }
}

impl std::fmt::Debug for InMemoryBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.namespaces.read().expect("lock poisoned").len();
        f.debug_struct("InMemoryBlobStore")
            .field("namespace_count", &count)
            .finish()
    }
}

/// Open session on one in-memory namespace.
///
/// Writes are staged locally and published to the shared map at `commit`;
/// dropping the session without committing discards them.
struct MemorySession<'a> {
    store: &'a InMemoryBlobStore,
    namespace: String,
    mode: OpenMode,
    pending: HashMap<String, Vec<u8>>,
}

impl MemorySession<'_> {
    fn committed_blob(&self, key: &str) -> StoreResult<Vec<u8>> {
        let map = self.store.namespaces.read().expect("lock poisoned");
        map.get(&self.namespace)
            .and_then(|ns| ns.get(key))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                key: key.to_string(),
            })
    }
}

impl BlobSession for MemorySession<'_> {
    fn size_of(&self, key: &str) -> StoreResult<usize> {
        Ok(self.committed_blob(key)?.len())
    }

    fn read_into(&self, key: &str, buf: &mut Vec<u8>) -> StoreResult<()> {
        let blob = self.committed_blob(key)?;
        buf.extend_from_slice(&blob);
        Ok(())
    }

    fn set(&mut self, key: &str, value: &[u8]) -> StoreResult<()> {
        if self.mode == OpenMode::ReadOnly {
            return Err(StoreError::ReadOnly);
        }
        self.pending.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn commit(&mut self) -> StoreResult<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let mut map = self.store.namespaces.write().expect("lock poisoned");
        let ns = map.entry(self.namespace.clone()).or_default();
        for (key, value) in self.pending.drain() {
            ns.insert(key, value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_only_open_requires_existing_namespace() {
        let store = InMemoryBlobStore::new();
        let err = store.open("creds", OpenMode::ReadOnly).err().unwrap();
        assert!(matches!(err, StoreError::NamespaceMissing { .. }));
    }

    #[test]
    fn set_commit_read_roundtrip() {
        let store = InMemoryBlobStore::new();
        {
            let mut session = store.open("creds", OpenMode::ReadWrite).unwrap();
            session.set("cert", b"\x30\x82abc").unwrap();
            session.commit().unwrap();
        }

        let session = store.open("creds", OpenMode::ReadOnly).unwrap();
        assert_eq!(session.size_of("cert").unwrap(), 7);

        let mut buf = Vec::new();
        session.read_into("cert", &mut buf).unwrap();
        assert_eq!(buf, b"\x30\x82abc");
    }

    #[test]
    fn uncommitted_writes_are_discarded() {
        let store = InMemoryBlobStore::new();
        {
            let mut session = store.open("creds", OpenMode::ReadWrite).unwrap();
            session.set("cert", b"data").unwrap();
            // No commit.
        }
        let session = store.open("creds", OpenMode::ReadOnly).unwrap();
        assert!(matches!(
            session.size_of("cert"),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn overwrite_replaces_blob() {
        let store = InMemoryBlobStore::new();
        let mut session = store.open("creds", OpenMode::ReadWrite).unwrap();
        session.set("key", b"first").unwrap();
        session.commit().unwrap();
        session.set("key", b"second!").unwrap();
        session.commit().unwrap();
        drop(session);

        assert_eq!(store.committed("creds", "key").unwrap(), b"second!");
        assert_eq!(store.namespace_len("creds"), 1);
    }

    #[test]
    fn read_only_session_rejects_writes() {
        let store = InMemoryBlobStore::new();
        store
            .open("creds", OpenMode::ReadWrite)
            .unwrap()
            .commit()
            .unwrap();
        let mut session = store.open("creds", OpenMode::ReadOnly).unwrap();
        let err = session.set("cert", b"data").err().unwrap();
        assert!(matches!(err, StoreError::ReadOnly));
    }

    #[test]
    fn missing_key_is_not_found() {
        let store = InMemoryBlobStore::new();
        let session = store.open("creds", OpenMode::ReadWrite).unwrap();
        assert!(matches!(
            session.size_of("absent"),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn init_partition_counts_events() {
        let store = InMemoryBlobStore::new();
        assert_eq!(store.init_count(), 0);
        store.init_partition().unwrap();
        store.init_partition().unwrap();
        assert_eq!(store.init_count(), 2);
    }
}
