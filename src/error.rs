// Error types for the file-cache coordinator.

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy for the cache coordinator.
///
/// `Retry` from the admission loop is intentionally absent here: it is an
/// internal sentinel consumed by [`crate::retry_driver::RetryOptions`] and
/// never surfaces to a caller. When the retry harness exhausts its attempt
/// budget while the sentinel is still being returned, it is reported as
/// [`Error::RetryExhausted`] instead.
#[derive(Error, Debug)]
pub enum Error {
    /// Lookup miss on a key that has no entry in the pool.
    #[error("no such key: {0}")]
    NoSuchKey(String),

    /// `put` was called on a key that already names a real entry.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// The requested entry size exceeds the manager's capacity.
    #[error("entry of size {size} exceeds capacity {cap}")]
    EntryTooLarge { size: u64, cap: u64 },

    /// The replacement policy's validity predicate admitted no victim.
    #[error("no evictable entry")]
    NoEvictableEntry,

    /// The retry harness exhausted its attempt budget while the admission
    /// loop kept signalling `Retry` (capacity still insufficient after an
    /// eviction, but further eviction might still help).
    #[error("retry attempts exhausted while admitting entry")]
    RetryExhausted,

    /// Byte-store backend failure not otherwise classified.
    #[error("backend error: {0}")]
    Backend(String),

    /// Entry codec failure (encode or decode).
    #[error("codec error: {0}")]
    Codec(String),

    /// Filesystem I/O failure from the file store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure from the embedded `sled` byte-store backend.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),
}

impl Error {
    /// True if this error was produced by a lookup miss against either the
    /// metadata pool or a byte-store backend.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NoSuchKey(_))
    }
}
