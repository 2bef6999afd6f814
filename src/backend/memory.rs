// In-memory `ByteStore`, grounded on the original source's `backend/gomap`
// adapter: a plain map guarded by a single reader-writer lock.

use super::ByteStore;
use crate::error::{Error, Result};
use parking_lot::RwLock;
use std::collections::HashMap;

/// `ByteStore` backed by an in-process `HashMap`. Useful for tests and for
/// callers who do not need the cache metadata to survive a restart.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<HashMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ByteStore for MemoryStore {
    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.inner.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        self.inner
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| Error::NoSuchKey(String::from_utf8_lossy(key).into_owned()))
    }

    fn remove(&self, key: &[u8]) -> Result<()> {
        self.inner.write().remove(key);
        Ok(())
    }

    fn iter(&self, visit: &mut dyn FnMut(&[u8], &[u8]) -> Result<()>) -> Result<()> {
        for (k, v) in self.inner.read().iter() {
            visit(k, v)?;
        }
        Ok(())
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}
