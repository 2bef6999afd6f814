// Embedded B+tree `ByteStore`, grounded on the original source's
// `backend/boltdb` adapter (open-on-construction, one bucket/tree, every
// operation wrapped in the engine's own transaction).

use super::ByteStore;
use crate::error::{Error, Result};
use std::path::Path;

/// `ByteStore` backed by an embedded `sled` database.
///
/// `sled` is the pure-Rust B+tree store the spec asks for as the
/// "embedded" metadata backend target; unlike the original source's
/// `boltdb` binding it needs no explicit bucket creation — the default tree
/// returned by `Db::open` is used directly.
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    /// Opens (or creates) a `sled` database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Wraps an already-open `sled::Db`, e.g. one sharing a process with
    /// other trees.
    pub fn from_db(db: sled::Db) -> Self {
        Self { db }
    }
}

impl ByteStore for SledStore {
    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.db.insert(key, value)?;
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        self.db
            .get(key)?
            .map(|ivec| ivec.to_vec())
            .ok_or_else(|| Error::NoSuchKey(String::from_utf8_lossy(key).into_owned()))
    }

    fn remove(&self, key: &[u8]) -> Result<()> {
        self.db.remove(key)?;
        Ok(())
    }

    fn iter(&self, visit: &mut dyn FnMut(&[u8], &[u8]) -> Result<()>) -> Result<()> {
        for pair in self.db.iter() {
            let (k, v) = pair?;
            visit(&k, &v)?;
        }
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::assert_byte_store_contract;

    #[test]
    fn satisfies_the_shared_byte_store_contract() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledStore::open(dir.path().join("pool.sled")).unwrap();
        assert_byte_store_contract(Box::new(store));
    }
}
