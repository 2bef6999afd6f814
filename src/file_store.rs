// File-store collaborator (spec section 4.3 demos / design notes): the
// manager's only touchpoint with the physical files it tracks. Grounded on
// the original source's `Item.Remove` (`os.Remove` on the item's path).

use crate::error::Result;
use parking_lot::Mutex;
use std::collections::HashMap;

/// The manager's view of the physical file layer: remove a path, and
/// optionally size one a producer has already materialized.
///
/// Eviction removal must be idempotent — an absent file is not an error.
/// This resolves the spec's open question about policies that (via a
/// permissive validity predicate) select a placeholder as victim: the
/// manager always calls `remove`, and a placeholder's path simply never
/// existed on disk.
pub trait FileStore: Send + Sync {
    /// Removes the file at `path`. A missing file is not an error.
    fn remove(&self, path: &str) -> Result<()>;

    /// Returns the size in bytes of the file at `path`. Used by a `once`
    /// producer that has already written the file and wants its size for
    /// the subsequent `put`; the admission loop itself never calls this.
    fn size(&self, path: &str) -> Result<u64>;
}

/// Real filesystem-backed [`FileStore`].
#[derive(Debug, Default, Clone, Copy)]
pub struct FsFileStore;

impl FileStore for FsFileStore {
    fn remove(&self, path: &str) -> Result<()> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn size(&self, path: &str) -> Result<u64> {
        Ok(std::fs::metadata(path)?.len())
    }
}

/// In-memory fake used across the test suite: records every path `remove`
/// was called with (so tests can assert exactly which files were evicted)
/// and returns pre-seeded sizes without touching disk.
#[derive(Default)]
pub struct FakeFileStore {
    removed: Mutex<Vec<String>>,
    sizes: Mutex<HashMap<String, u64>>,
}

impl FakeFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the size a subsequent `size(path)` call should report.
    pub fn set_size(&self, path: impl Into<String>, size: u64) {
        self.sizes.lock().insert(path.into(), size);
    }

    /// Paths passed to `remove`, in call order (duplicates preserved).
    pub fn removed_paths(&self) -> Vec<String> {
        self.removed.lock().clone()
    }
}

impl FileStore for FakeFileStore {
    fn remove(&self, path: &str) -> Result<()> {
        self.removed.lock().push(path.to_string());
        Ok(())
    }

    fn size(&self, path: &str) -> Result<u64> {
        Ok(self.sizes.lock().get(path).copied().unwrap_or(0))
    }
}
