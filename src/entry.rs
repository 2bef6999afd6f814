// Entry record: the persisted shape of one cache slot (spec section 3/4.1).

use chrono::{DateTime, TimeZone, Utc};
use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};

/// A cache entry.
///
/// Timestamps are stored as milliseconds since the Unix epoch so the record
/// stays a plain-old-data shape for the `rkyv` codec; [`Entry::created_at`]
/// and [`Entry::last_used`] hand back real [`DateTime<Utc>`] values.
///
/// A placeholder entry (`real = false`) is not a distinct type: it is an
/// `Entry` with `size = 0` that has not yet been promoted by [`Entry::promote`].
/// This mirrors the tagged-variant design called for in the spec's design
/// notes rather than splitting real/placeholder into two record types.
#[derive(
    Debug, Clone, PartialEq, Serialize, Deserialize, Archive, RkyvSerialize, RkyvDeserialize,
)]
#[archive(check_bytes)]
#[archive_attr(derive(Debug))]
pub struct Entry {
    id: u64,
    key: String,
    path: String,
    size: u64,
    ref_count: u32,
    used: u32,
    real: bool,
    created_at_millis: i64,
    last_used_millis: i64,
}

impl Entry {
    /// Creates a real entry whose path defaults to its key (spec section 3,
    /// "Create-real").
    pub(crate) fn new_real(id: u64, key: &str, size: u64) -> Self {
        Self {
            id,
            key: key.to_string(),
            path: key.to_string(),
            size,
            ref_count: 0,
            used: 0,
            real: true,
            created_at_millis: Utc::now().timestamp_millis(),
            last_used_millis: 0,
        }
    }

    /// Creates an unreferenced placeholder. Callers pin it immediately via
    /// [`Entry::pin`] to match the spec's "Create-placeholder" lifecycle,
    /// which bakes the first `incr_ref` into placeholder creation.
    pub(crate) fn new_placeholder(id: u64, key: &str) -> Self {
        Self {
            id,
            key: key.to_string(),
            path: key.to_string(),
            size: 0,
            ref_count: 0,
            used: 0,
            real: false,
            created_at_millis: 0,
            last_used_millis: 0,
        }
    }

    /// Promotes a placeholder to a real entry, or re-admits the size of a
    /// real one. Callers must check [`Entry::is_real`] first if duplicate
    /// detection is required; `MetadataPool::put` does this.
    pub(crate) fn promote(&mut self, size: u64) {
        self.real = true;
        self.size = size;
        self.created_at_millis = Utc::now().timestamp_millis();
    }

    /// Increments `ref` and `used`, and refreshes `last_used` to now.
    pub(crate) fn pin(&mut self) {
        self.ref_count += 1;
        self.used += 1;
        self.last_used_millis = Utc::now().timestamp_millis();
    }

    /// Decrements `ref` if positive; otherwise a no-op.
    pub(crate) fn unpin(&mut self) {
        if self.ref_count > 0 {
            self.ref_count -= 1;
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn ref_count(&self) -> u32 {
        self.ref_count
    }

    pub fn used(&self) -> u32 {
        self.used
    }

    pub fn is_real(&self) -> bool {
        self.real
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        millis_to_datetime(self.created_at_millis)
    }

    pub fn last_used(&self) -> DateTime<Utc> {
        millis_to_datetime(self.last_used_millis)
    }
}

fn millis_to_datetime(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis).single().unwrap_or_else(|| Utc.timestamp_opt(0, 0).unwrap())
}
