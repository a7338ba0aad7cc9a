use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::traits::{BlobSession, BlobStore, OpenMode};

/// On-disk partition format version, recorded in the `FORMAT` marker file.
const FORMAT_VERSION: u32 = 1;

/// Name of the partition format marker file.
const FORMAT_MARKER: &str = "FORMAT";

/// File-backed blob store.
///
/// Layout under the partition root:
/// ```text
/// <root>/FORMAT              format version marker
/// <root>/<namespace>/<key>   one file per committed blob
/// ```
/// Commits write each staged blob to a temporary file, sync it, and rename
/// it into place, so a blob file is always either the old or the new value.
/// Concurrent commits to the same key resolve last-writer-wins.
pub struct FileBlobStore {
    root: PathBuf,
}

impl FileBlobStore {
    /// Create a store rooted at `root`. No I/O happens until
    /// `init_partition`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The partition root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn write_marker(&self) -> StoreResult<()> {
        fs::write(self.root.join(FORMAT_MARKER), format!("{FORMAT_VERSION}\n"))?;
        Ok(())
    }
}

impl BlobStore for FileBlobStore {
    fn init_partition(&self) -> StoreResult<()> {
        fs::create_dir_all(&self.root)?;

        let marker = self.root.join(FORMAT_MARKER);
        match fs::read_to_string(&marker) {
            Ok(contents) => {
                let found: u32 = contents.trim().parse().map_err(|_| {
                    StoreError::Corrupt(format!(
                        "unreadable format marker: {contents:?}"
                    ))
                })?;
                if found != FORMAT_VERSION {
                    // A partition written by a different format version
                    // cannot be read; erase and recreate it. Only the
                    // partition itself is erased here.
                    warn!(found, expected = FORMAT_VERSION, "partition format mismatch, erasing");
                    fs::remove_dir_all(&self.root)?;
                    fs::create_dir_all(&self.root)?;
                    self.write_marker()?;
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(root = %self.root.display(), "formatting new partition");
                self.write_marker()?;
            }
            Err(e) => return Err(e.into()),
        }

        Ok(())
    }

    fn open<'a>(
        &'a self,
        namespace: &str,
        mode: OpenMode,
    ) -> StoreResult<Box<dyn BlobSession + 'a>> {
        let dir = self.root.join(namespace);
        match mode {
            OpenMode::ReadOnly => {
                if !dir.is_dir() {
                    return Err(StoreError::NamespaceMissing {
                        namespace: namespace.to_string(),
                    });
                }
            }
            OpenMode::ReadWrite => fs::create_dir_all(&dir)?,
        }

        Ok(Box::new(FileSession {
            dir,
            mode,
            pending: HashMap::new(),
        }))
    }
}

impl std::fmt::Debug for FileBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileBlobStore")
            .field("root", &self.root)
            .finish()
    }
}

/// Open session on one namespace directory.
struct FileSession {
    dir: PathBuf,
    mode: OpenMode,
    pending: HashMap<String, Vec<u8>>,
}

impl FileSession {
    fn blob_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl BlobSession for FileSession {
    fn size_of(&self, key: &str) -> StoreResult<usize> {
        match fs::metadata(self.blob_path(key)) {
            Ok(meta) => Ok(meta.len() as usize),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound {
                key: key.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    fn read_into(&self, key: &str, buf: &mut Vec<u8>) -> StoreResult<()> {
        let mut file = match File::open(self.blob_path(key)) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound {
                    key: key.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        file.read_to_end(buf)?;
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
        for (key, value) in self.pending.drain() {
            debug!(key = %key, len = value.len(), "committing blob");
            let tmp = self.dir.join(format!(".{key}.tmp"));
            let mut file = File::create(&tmp)?;
            file.write_all(&value)?;
            file.sync_all()?;
            fs::rename(&tmp, self.dir.join(&key))?;
        }
        Ok(())
    }
}
