//! fcache
//!
//! A bounded-capacity file-cache coordinator.
//!
//! fcache tracks on-disk artifacts as logical cache entries, enforces a
//! byte-capacity budget, reclaims space when needed by evicting entries
//! according to a pluggable replacement policy, and pins entries against
//! eviction through reference counting.
//!
//! The crate never reads or writes file bytes itself — it issues "remove
//! this path" requests to an injected `FileStore` and persists entry
//! metadata through an injected `ByteStore` + `Codec` pair. This keeps the
//! hard part (capacity accounting, eviction, retry under contention)
//! independent of where files and metadata actually live.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use fcache::{
//!     CacheManager, CacheManagerOptions, FifoPolicy, FsFileStore, MemoryStore, RkyvCodec,
//! };
//!
//! # fn main() -> fcache::Result<()> {
//! let manager = CacheManager::new(CacheManagerOptions::new(
//!     1_000_000,
//!     Box::new(MemoryStore::new()),
//!     Box::new(RkyvCodec),
//!     Box::new(FifoPolicy::default()),
//!     Box::new(FsFileStore),
//! ))?;
//!
//! manager.set("tile_12_34.png", 4096)?;
//! manager.register(&["tile_12_34.png"])?;
//! let entry = manager.get("tile_12_34.png")?;
//! assert_eq!(entry.size(), 4096);
//! # Ok(())
//! # }
//! ```

// Re-export main types
pub use backend::{ByteStore, MemoryStore, SledStore};
pub use codec::{Codec, JsonCodec, RkyvCodec};
pub use entry::Entry;
pub use error::{Error, Result};
pub use file_store::{FakeFileStore, FileStore, FsFileStore};
pub use manager::{CacheManager, CacheManagerOptions, OnceContext};
pub use policy::{
    Fifo as FifoPolicy, Lifo as LifoPolicy, Lru as LruPolicy, Mru as MruPolicy, Policy,
    Rr as RrPolicy, ValidityOptions,
};
pub use retry_driver::{RetryDelay, RetryOptions};

// Core modules
pub mod backend;
pub mod codec;
pub mod entry;
pub mod error;
pub mod file_store;
pub mod manager;
pub mod policy;
pub mod pool;
pub mod retry_driver;
