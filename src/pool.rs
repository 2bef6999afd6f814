// Metadata pool (spec section 4.2): single point of authority for the
// key -> entry mapping, hiding the raw byte store and codec behind it.
//
// Grounded on the original source's `backend/adapter.go`: a generic adapter
// over a `Store` + `Codec` pair that owns id assignment and the
// placeholder-on-missing-key behaviour of `IncrRef`.

use crate::backend::ByteStore;
use crate::codec::Codec;
use crate::entry::Entry;
use crate::error::{Error, Result};
use std::sync::atomic::{AtomicU64, Ordering};

/// Key -> [`Entry`] mapping over an injected [`ByteStore`] and [`Codec`].
///
/// Not internally synchronized for cross-operation atomicity — the manager
/// serializes mutators behind its own reader-writer lock (spec section 5).
/// Concurrent *reads* of independent keys are still safe, since both
/// shipped backends ([`crate::backend::MemoryStore`],
/// [`crate::backend::SledStore`]) are thread-safe on their own.
pub struct MetadataPool {
    backend: Box<dyn ByteStore>,
    codec: Box<dyn Codec>,
    next_id: AtomicU64,
}

impl MetadataPool {
    pub fn new(backend: Box<dyn ByteStore>, codec: Box<dyn Codec>) -> Self {
        Self { backend, codec, next_id: AtomicU64::new(1) }
    }

    fn alloc_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Visits every entry exactly once in arbitrary order; stops on the
    /// first error the visitor returns. The pool must not be mutated from
    /// within `visit` — behavior is undefined if it is.
    pub fn iter(&self, mut visit: impl FnMut(&str, &Entry) -> Result<()>) -> Result<()> {
        self.backend.iter(&mut |k, v| {
            let key = std::str::from_utf8(k).map_err(|e| Error::Codec(e.to_string()))?;
            let entry = self.codec.decode(v)?;
            visit(key, &entry)
        })
    }

    /// Inserts a real entry if `key` is absent, promotes a placeholder in
    /// place, or fails with [`Error::DuplicateKey`] if `key` already names a
    /// real entry. Capacity arithmetic is the caller's responsibility.
    pub fn put(&self, key: &str, size: u64) -> Result<Entry> {
        let raw_key = key.as_bytes();
        match self.backend.get(raw_key) {
            Ok(bytes) => {
                let mut entry = self.codec.decode(&bytes)?;
                if entry.is_real() {
                    return Err(Error::DuplicateKey(key.to_string()));
                }
                entry.promote(size);
                self.persist(raw_key, &entry)?;
                Ok(entry)
            }
            Err(Error::NoSuchKey(_)) => {
                let entry = Entry::new_real(self.alloc_id(), key, size);
                self.persist(raw_key, &entry)?;
                Ok(entry)
            }
            Err(e) => Err(e),
        }
    }

    /// Fails with [`Error::NoSuchKey`] if `key` is absent.
    pub fn get(&self, key: &str) -> Result<Entry> {
        let bytes = self.backend.get(key.as_bytes())?;
        self.codec.decode(&bytes).map_err(|e| {
            log::error!("failed to decode entry {key}: {e}");
            e
        })
    }

    /// Idempotent: no error if `key` is absent.
    pub fn remove(&self, key: &str) -> Result<()> {
        self.backend.remove(key.as_bytes())
    }

    /// For each key: creates a placeholder if absent, else loads the
    /// existing entry; then increments `ref`/`used` and refreshes
    /// `last_used`. Not transactional across keys — a store error midway
    /// leaves earlier keys in the batch already updated.
    pub fn incr_ref(&self, keys: &[&str]) -> Result<()> {
        for &key in keys {
            let raw_key = key.as_bytes();
            let mut entry = match self.backend.get(raw_key) {
                Ok(bytes) => self.codec.decode(&bytes)?,
                Err(Error::NoSuchKey(_)) => {
                    log::debug!("creating placeholder for {key}");
                    Entry::new_placeholder(self.alloc_id(), key)
                }
                Err(e) => return Err(e),
            };
            entry.pin();
            self.persist(raw_key, &entry)?;
        }
        Ok(())
    }

    /// For each present key with `ref > 0`, decrements it. Missing keys are
    /// silently skipped.
    pub fn decr_ref(&self, keys: &[&str]) -> Result<()> {
        for &key in keys {
            let raw_key = key.as_bytes();
            match self.backend.get(raw_key) {
                Ok(bytes) => {
                    let mut entry = self.codec.decode(&bytes)?;
                    entry.unpin();
                    self.persist(raw_key, &entry)?;
                }
                Err(Error::NoSuchKey(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Releases the underlying byte-store resources.
    pub fn close(&self) -> Result<()> {
        self.backend.close()
    }

    fn persist(&self, raw_key: &[u8], entry: &Entry) -> Result<()> {
        let bytes = self.codec.encode(entry).map_err(|e| {
            log::error!("failed to encode entry {}: {e}", entry.key());
            e
        })?;
        self.backend.put(raw_key, &bytes).map_err(|e| {
            log::error!("backend put failed for {}: {e}", entry.key());
            e
        })
    }
}
