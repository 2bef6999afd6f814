// Cache manager (spec section 4.4): the central coordinator. Owns capacity
// accounting, serializes writers behind a single reader-writer lock, drives
// the admit/evict loop, and exposes the `once` materialization protocol and
// pin/unpin.
//
// Grounded on the original source's `fcache.go` (`Manager`, `Set`, `Get`,
// `Register`/`Unregister`, `lockFn`/`rlockFn`) for the locking discipline
// and admission loop shape.

use crate::backend::ByteStore;
use crate::codec::Codec;
use crate::entry::Entry;
use crate::error::{Error, Result};
use crate::file_store::FileStore;
use crate::policy::Policy;
use crate::pool::MetadataPool;
use crate::retry_driver::RetryOptions;
use parking_lot::RwLock;
use retry::OperationResult;

/// Construction record for a [`CacheManager`] (spec section 6).
///
/// Rust's type system makes the spec's "missing codec/backend/policy is a
/// programmer error detected at first use" moot: every collaborator is a
/// required constructor argument, so the equivalent mistake is a compile
/// error rather than a runtime one.
pub struct CacheManagerOptions {
    capacity: u64,
    backend: Box<dyn ByteStore>,
    codec: Box<dyn Codec>,
    policy: Box<dyn Policy>,
    file_store: Box<dyn FileStore>,
    retry: RetryOptions,
}

impl CacheManagerOptions {
    pub fn new(
        capacity: u64,
        backend: Box<dyn ByteStore>,
        codec: Box<dyn Codec>,
        policy: Box<dyn Policy>,
        file_store: Box<dyn FileStore>,
    ) -> Self {
        Self { capacity, backend, codec, policy, file_store, retry: RetryOptions::default() }
    }

    /// Overrides the default single-attempt retry configuration.
    pub fn with_retry(mut self, retry: RetryOptions) -> Self {
        self.retry = retry;
        self
    }
}

struct ManagerState {
    usage: u64,
    pool: MetadataPool,
}

/// The bounded-capacity file-cache coordinator.
///
/// One reader-writer lock guards usage accounting, the pool view, and
/// policy iteration together (spec section 5): readers (`get`, `once`'s
/// initial lookup) take a shared lock, writers (`set`'s admission loop,
/// `register`, `unregister`, `once`'s `rollback`) take an exclusive lock for
/// the entire critical section.
pub struct CacheManager {
    cap: u64,
    state: RwLock<ManagerState>,
    policy: Box<dyn Policy>,
    file_store: Box<dyn FileStore>,
    retry: RetryOptions,
}

/// Outcome of a single admission-loop attempt (spec section 4.4's state
/// machine: `PutOk`, `Retry`, or an explicit error are the only terminal
/// states of one attempt).
enum Attempt {
    Done(Entry),
    Retry,
    Err(Error),
}

impl CacheManager {
    /// Builds a manager and recovers usage accounting by iterating the
    /// backend once and summing the size of every real entry (spec section
    /// 9, "usage recovery at startup"). Usage is never persisted, so this
    /// runs unconditionally — a freshly created empty backend just sums to
    /// zero.
    pub fn new(options: CacheManagerOptions) -> Result<Self> {
        let pool = MetadataPool::new(options.backend, options.codec);

        let mut usage = 0u64;
        pool.iter(|_key, entry| {
            if entry.is_real() {
                usage += entry.size();
            }
            Ok(())
        })?;
        log::debug!("cache manager recovered usage={usage} cap={}", options.capacity);

        Ok(Self {
            cap: options.capacity,
            state: RwLock::new(ManagerState { usage, pool }),
            policy: options.policy,
            file_store: options.file_store,
            retry: options.retry,
        })
    }

    /// The configured byte capacity.
    pub fn cap(&self) -> u64 {
        self.cap
    }

    /// Admits a new real entry, evicting under the configured policy and
    /// retry options if necessary.
    pub fn set(&self, key: &str, size: u64) -> Result<Entry> {
        if size > self.cap {
            return Err(Error::EntryTooLarge { size, cap: self.cap });
        }

        let outcome = self.retry.run(|| match self.try_admit(key, size) {
            Attempt::Done(entry) => OperationResult::Ok(entry),
            Attempt::Retry => OperationResult::Retry(Error::RetryExhausted),
            Attempt::Err(e) => OperationResult::Err(e),
        });

        if let Err(ref e) = outcome {
            log::warn!("set({key}, {size}) failed: {e}");
        }
        outcome
    }

    /// Shared-lock read from the pool. Surfaces [`Error::NoSuchKey`] unchanged.
    pub fn get(&self, key: &str) -> Result<Entry> {
        self.state.read().pool.get(key)
    }

    /// If `get(key)` succeeds, returns that entry without invoking
    /// `producer`. Otherwise invokes `producer` with a context bound to
    /// this manager and returns its result.
    ///
    /// This protocol lets a producer (e.g. a downloader) check the entry
    /// would fit, perform its own I/O outside the manager's lock, and
    /// either `put` the materialized file or `rollback` the attempt — see
    /// [`OnceContext`].
    pub fn once<F>(&self, key: &str, producer: F) -> Result<Entry>
    where
        F: FnOnce(&OnceContext<'_>) -> Result<Entry>,
    {
        match self.get(key) {
            Ok(entry) => Ok(entry),
            Err(Error::NoSuchKey(_)) => producer(&OnceContext { manager: self }),
            Err(e) => Err(e),
        }
    }

    /// Pins `keys`, creating placeholders for any that are absent.
    pub fn register(&self, keys: &[&str]) -> Result<()> {
        self.state.write().pool.incr_ref(keys)
    }

    /// Unpins `keys`. Missing keys or already-unreferenced keys are a no-op.
    pub fn unregister(&self, keys: &[&str]) -> Result<()> {
        self.state.write().pool.decr_ref(keys)
    }

    /// One attempt of the admission loop (spec section 4.4):
    /// `{Check -> Fit? -> Put}` or `{Check -> Evict -> Check -> Put}` or
    /// `{Check -> Evict -> Retry}`.
    fn try_admit(&self, key: &str, size: u64) -> Attempt {
        let mut state = self.state.write();

        if state.usage + size <= self.cap {
            return match state.pool.put(key, size) {
                Ok(entry) => {
                    state.usage += size;
                    log::debug!("admitted {key} ({size} bytes) without eviction, usage={}", state.usage);
                    Attempt::Done(entry)
                }
                Err(e) => Attempt::Err(e),
            };
        }

        let victim = match self.policy.evict(&state.pool) {
            Ok(v) => v,
            Err(Error::NoEvictableEntry) => {
                log::warn!("no evictable entry found while admitting {key} ({size} bytes)");
                return Attempt::Err(Error::NoEvictableEntry);
            }
            Err(e) => return Attempt::Err(e),
        };
        log::debug!("evicting {} ({} bytes) to admit {key} ({size} bytes)", victim.key(), victim.size());

        // Removal is idempotent regardless of whether the policy handed
        // back a real entry or (via a permissive predicate) a placeholder
        // whose path never existed on disk (spec section 9's open question).
        if let Err(e) = self.file_store.remove(victim.path()) {
            return Attempt::Err(e);
        }
        if let Err(e) = state.pool.remove(victim.key()) {
            return Attempt::Err(e);
        }
        state.usage = state.usage.saturating_sub(victim.size());

        if state.usage + size > self.cap {
            log::debug!(
                "usage={} still exceeds cap={} after evicting {} for {key}, signalling retry",
                state.usage,
                self.cap,
                victim.key()
            );
            return Attempt::Retry;
        }

        match state.pool.put(key, size) {
            Ok(entry) => {
                state.usage += size;
                Attempt::Done(entry)
            }
            Err(e) => Attempt::Err(e),
        }
    }

    /// Removes `key` under the writer lock, adjusting usage accounting if
    /// it named a real entry. Used by [`OnceContext::rollback`].
    fn rollback(&self, key: &str) -> Result<()> {
        let mut state = self.state.write();
        if let Ok(entry) = state.pool.get(key) {
            if entry.is_real() {
                state.usage = state.usage.saturating_sub(entry.size());
            }
        }
        state.pool.remove(key)
    }

    /// Current tracked usage, in bytes. Exposed for tests and diagnostics;
    /// not part of the spec's external interface.
    pub fn usage(&self) -> u64 {
        self.state.read().usage
    }

    /// Releases the underlying metadata store.
    pub fn close(&self) -> Result<()> {
        self.state.read().pool.close()
    }
}

/// Callbacks bound to a [`CacheManager`], handed to a producer by
/// [`CacheManager::once`].
pub struct OnceContext<'a> {
    manager: &'a CacheManager,
}

impl<'a> OnceContext<'a> {
    /// Fails with [`Error::EntryTooLarge`] if `entry`'s size would not fit
    /// the manager's capacity at all, letting a producer check before
    /// performing expensive I/O.
    pub fn precondition_check(&self, entry: &Entry) -> Result<()> {
        if entry.size() > self.manager.cap {
            return Err(Error::EntryTooLarge { size: entry.size(), cap: self.manager.cap });
        }
        Ok(())
    }

    /// Equivalent to `CacheManager::set(path, size)`.
    pub fn put(&self, path: &str, size: u64) -> Result<Entry> {
        self.manager.set(path, size)
    }

    /// Removes the entry under the writer lock, undoing a reservation made
    /// by an earlier `put` in this same producer.
    pub fn rollback(&self, key: &str) -> Result<()> {
        self.manager.rollback(key)
    }
}
