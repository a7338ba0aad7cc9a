//! One-time storage partition initialization.

use std::sync::Mutex;

use p11_store::BlobStore;
use tracing::{debug, error};

use crate::error::{PalError, PalResult};

/// Initialization state of the storage partition.
enum InitState {
    /// `init_partition` has not run yet.
    Uninitialized,
    /// Initialization completed; storage operations may proceed.
    Ready,
    /// Initialization failed with this message. The failure is sticky:
    /// nothing at this layer retries it.
    Failed(String),
}

/// Guard ensuring the storage partition is initialized exactly once.
///
/// Every PAL entry point calls [`ensure_ready`] before touching storage.
/// The first caller runs the engine's `init_partition` while holding the
/// internal mutex; concurrent callers block until that transition
/// finishes, then short-circuit on the `Ready` state. The mutex is held
/// only across the check-and-initialize section, never across ordinary
/// store operations.
///
/// [`ensure_ready`]: NamespaceGuard::ensure_ready
pub(crate) struct NamespaceGuard {
    state: Mutex<InitState>,
}

impl NamespaceGuard {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(InitState::Uninitialized),
        }
    }

    /// Block until the partition is initialized, running the one-time
    /// initialization if this is the first call.
    ///
    /// After a failed initialization every call returns `PalError::Fatal`
    /// with the original failure message.
    pub fn ensure_ready(&self, store: &dyn BlobStore) -> PalResult<()> {
        let mut state = self.state.lock().expect("init mutex poisoned");
        match &*state {
            InitState::Ready => Ok(()),
            InitState::Failed(msg) => Err(PalError::Fatal(msg.clone())),
            InitState::Uninitialized => {
                debug!("initializing token storage partition");
                match store.init_partition() {
                    Ok(()) => {
                        *state = InitState::Ready;
                        Ok(())
                    }
                    Err(e) => {
                        error!(error = %e, "token storage partition initialization failed");
                        let msg = e.to_string();
                        *state = InitState::Failed(msg.clone());
                        Err(PalError::Fatal(msg))
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use p11_store::{
        BlobSession, InMemoryBlobStore, OpenMode, StoreError, StoreResult,
    };

    use super::*;

    #[test]
    fn initializes_exactly_once() {
        let store = InMemoryBlobStore::new();
        let guard = NamespaceGuard::new();
        guard.ensure_ready(&store).unwrap();
        guard.ensure_ready(&store).unwrap();
        guard.ensure_ready(&store).unwrap();
        assert_eq!(store.init_count(), 1);
    }

    #[test]
    fn concurrent_first_callers_see_one_init_event() {
        let store = Arc::new(InMemoryBlobStore::new());
        let guard = Arc::new(NamespaceGuard::new());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                let guard = Arc::clone(&guard);
                thread::spawn(move || guard.ensure_ready(store.as_ref()))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        assert_eq!(store.init_count(), 1);
    }

    /// Engine whose partition initialization always fails.
    struct BrokenStore;

    impl BlobStore for BrokenStore {
        fn init_partition(&self) -> StoreResult<()> {
            Err(StoreError::Corrupt("bad partition".into()))
        }

        fn open<'a>(
            &'a self,
            _namespace: &str,
            _mode: OpenMode,
        ) -> StoreResult<Box<dyn BlobSession + 'a>> {
            unreachable!("open must not be called when init failed")
        }
    }

    #[test]
    fn failed_init_is_sticky_and_fatal() {
        let store = BrokenStore;
        let guard = NamespaceGuard::new();

        let first = guard.ensure_ready(&store).err().unwrap();
        assert!(matches!(first, PalError::Fatal(_)));

        // Not retried: the same fatal condition comes back.
        let second = guard.ensure_ready(&store).err().unwrap();
        match second {
            PalError::Fatal(msg) => assert!(msg.contains("bad partition")),
            other => panic!("expected Fatal, got {other:?}"),
        }
    }
}
