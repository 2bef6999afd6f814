// Replacement policy (spec section 4.3): five eviction strategies that
// share an iterate-and-select skeleton and differ only in comparator.
//
// Grounded on the original source's `policy-fifo.go` / `policy-lru.go` /
// `policy-mru.go` / `policy-rr.go` (iterate, validate, track an extremum)
// and `validate.go` (the composable validity predicate built from options).

use crate::entry::Entry;
use crate::error::{Error, Result};
use crate::pool::MetadataPool;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::time::Duration;

/// Composable validity predicate (spec section 4.3).
///
/// Two options are on by default — excluding placeholders and excluding
/// referenced (pinned) entries — matching the spec's testable properties 3
/// and 4. Each has a dual permissive form that lifts the corresponding
/// constraint. Composition is conjunctive: every enabled constraint must
/// hold for an entry to be a legal victim.
#[derive(Debug, Clone, Copy)]
pub struct ValidityOptions {
    allow_placeholders: bool,
    allow_referenced: bool,
    min_used: u32,
    min_live_time: Option<Duration>,
    min_since_used: Option<Duration>,
}

impl Default for ValidityOptions {
    fn default() -> Self {
        Self {
            allow_placeholders: false,
            allow_referenced: false,
            min_used: 0,
            min_live_time: None,
            min_since_used: None,
        }
    }
}

impl ValidityOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lifts the default "exclude placeholders" constraint.
    pub fn allow_placeholders(mut self) -> Self {
        self.allow_placeholders = true;
        self
    }

    /// Lifts the default "exclude referenced" constraint.
    pub fn allow_referenced(mut self) -> Self {
        self.allow_referenced = true;
        self
    }

    /// Admits only entries with `used >= n`.
    pub fn min_used(mut self, n: u32) -> Self {
        self.min_used = n;
        self
    }

    /// Admits only entries with `now - created_at >= delta`.
    pub fn min_live_time(mut self, delta: Duration) -> Self {
        self.min_live_time = Some(delta);
        self
    }

    /// Admits only entries with `now - last_used >= delta`.
    pub fn min_since_used(mut self, delta: Duration) -> Self {
        self.min_since_used = Some(delta);
        self
    }

    fn is_valid(&self, entry: &Entry, now: DateTime<Utc>) -> bool {
        if !self.allow_placeholders && !entry.is_real() {
            return false;
        }
        if !self.allow_referenced && entry.ref_count() > 0 {
            return false;
        }
        if entry.used() < self.min_used {
            return false;
        }
        if let Some(delta) = self.min_live_time {
            if now - entry.created_at() < to_chrono(delta) {
                return false;
            }
        }
        if let Some(delta) = self.min_since_used {
            if now - entry.last_used() < to_chrono(delta) {
                return false;
            }
        }
        true
    }
}

fn to_chrono(d: Duration) -> ChronoDuration {
    // A `Duration` wide enough to exceed any config the crate would take
    // seriously; `from_std` only overflows for multi-century inputs.
    ChronoDuration::from_std(d).unwrap_or_else(|_| ChronoDuration::days(365 * 500))
}

/// A cache replacement algorithm able to select a victim.
///
/// A policy performs a single iteration of the pool filtered by its
/// validity predicate; it reports [`Error::NoEvictableEntry`] when no entry
/// passes and no store error occurred.
pub trait Policy: Send + Sync {
    fn evict(&self, pool: &MetadataPool) -> Result<Entry>;
}

/// Shared skeleton for the four comparator-based policies: iterate, filter
/// by the validity predicate, keep the extremum according to `pick`.
fn select_extremum(
    pool: &MetadataPool,
    opts: &ValidityOptions,
    mut is_better: impl FnMut(&Entry, &Entry) -> bool,
) -> Result<Entry> {
    let now = Utc::now();
    let mut victim: Option<Entry> = None;
    pool.iter(|_key, entry| {
        if !opts.is_valid(entry, now) {
            return Ok(());
        }
        let replace = match &victim {
            None => true,
            Some(current) => is_better(entry, current),
        };
        if replace {
            victim = Some(entry.clone());
        }
        Ok(())
    })?;
    victim.ok_or(Error::NoEvictableEntry)
}

/// First-in-first-out: evicts the entry with the minimum `created_at`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fifo(ValidityOptions);

impl Fifo {
    pub fn new(opts: ValidityOptions) -> Self {
        Self(opts)
    }
}

impl Policy for Fifo {
    fn evict(&self, pool: &MetadataPool) -> Result<Entry> {
        select_extremum(pool, &self.0, |candidate, current| {
            candidate.created_at() < current.created_at()
        })
    }
}

/// Last-in-first-out: evicts the entry with the maximum `created_at`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lifo(ValidityOptions);

impl Lifo {
    pub fn new(opts: ValidityOptions) -> Self {
        Self(opts)
    }
}

impl Policy for Lifo {
    fn evict(&self, pool: &MetadataPool) -> Result<Entry> {
        select_extremum(pool, &self.0, |candidate, current| {
            candidate.created_at() > current.created_at()
        })
    }
}

/// Least-recently-used: evicts the entry with the minimum `last_used`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lru(ValidityOptions);

impl Lru {
    pub fn new(opts: ValidityOptions) -> Self {
        Self(opts)
    }
}

impl Policy for Lru {
    fn evict(&self, pool: &MetadataPool) -> Result<Entry> {
        select_extremum(pool, &self.0, |candidate, current| {
            candidate.last_used() < current.last_used()
        })
    }
}

/// Most-recently-used: evicts the entry with the maximum `last_used`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mru(ValidityOptions);

impl Mru {
    pub fn new(opts: ValidityOptions) -> Self {
        Self(opts)
    }
}

impl Policy for Mru {
    fn evict(&self, pool: &MetadataPool) -> Result<Entry> {
        select_extremum(pool, &self.0, |candidate, current| {
            candidate.last_used() > current.last_used()
        })
    }
}

/// Random replacement: selects any single valid entry (in practice, the
/// iteration's last visited one — the original implementation this spec is
/// drawn from makes the same choice, and the spec's tie-break rule allows
/// any stable selection).
#[derive(Debug, Clone, Copy, Default)]
pub struct Rr(ValidityOptions);

impl Rr {
    pub fn new(opts: ValidityOptions) -> Self {
        Self(opts)
    }
}

impl Policy for Rr {
    fn evict(&self, pool: &MetadataPool) -> Result<Entry> {
        let now = Utc::now();
        let mut victim: Option<Entry> = None;
        pool.iter(|_key, entry| {
            if self.0.is_valid(entry, now) {
                victim = Some(entry.clone());
            }
            Ok(())
        })?;
        victim.ok_or(Error::NoEvictableEntry)
    }
}
