// Integration tests exercising fcache as a black box through its public
// API: the literal scenarios from the specification (S1-S8) plus a
// randomized property check of the universal invariants.

use fcache::{
    CacheManager, CacheManagerOptions, Error, FakeFileStore, FifoPolicy, LifoPolicy, LruPolicy,
    MemoryStore, MruPolicy, Policy, RetryOptions, RkyvCodec, SledStore, ValidityOptions,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

fn memory_manager(cap: u64, policy: Box<dyn Policy>) -> CacheManager {
    CacheManager::new(CacheManagerOptions::new(
        cap,
        Box::new(MemoryStore::new()),
        Box::new(RkyvCodec),
        policy,
        Box::new(FakeFileStore::new()),
    ))
    .unwrap()
}

/// Like `memory_manager`, but configured to retry the admission loop —
/// needed whenever a single `set` requires more than one eviction to fit
/// (the default config is a single attempt, see `RetryOptions::once`).
fn memory_manager_with_retries(cap: u64, policy: Box<dyn Policy>, attempts: usize) -> CacheManager {
    CacheManager::new(
        CacheManagerOptions::new(
            cap,
            Box::new(MemoryStore::new()),
            Box::new(RkyvCodec),
            policy,
            Box::new(FakeFileStore::new()),
        )
        .with_retry(RetryOptions::fixed(attempts, Duration::from_millis(0))),
    )
    .unwrap()
}

#[test]
fn s1_fit_without_eviction() {
    let mgr = memory_manager(1000, Box::new(LruPolicy::default()));
    mgr.set("a", 400).unwrap();
    mgr.set("b", 300).unwrap();
    assert_eq!(mgr.usage(), 700);
    assert!(mgr.get("a").is_ok());
    assert!(mgr.get("b").is_ok());
}

#[test]
fn s2_evict_under_pressure_keeps_registered_a_keys() {
    // Some admissions in this sequence (e.g. "b2") require evicting more
    // than one victim to fit, so the admission loop must be allowed to
    // retry rather than run under the single-attempt default.
    let mgr = memory_manager_with_retries(200, Box::new(FifoPolicy::default()), 10);
    mgr.register(&["a"]).unwrap();

    for (key, size) in [
        ("a", 40),
        ("b", 20),
        ("c", 30),
        ("d", 10),
        ("e", 0),
        ("b1", 100),
        ("b2", 50),
        ("c1", 50),
        ("c2", 50),
    ] {
        mgr.set(key, size).unwrap();
    }

    assert!(mgr.get("a").is_ok());
    assert!(mgr.usage() <= 200);
}

#[test]
fn s3_entry_too_large() {
    let mgr = memory_manager(1000, Box::new(FifoPolicy::default()));
    let err = mgr.set("x", 1001).unwrap_err();
    assert!(matches!(err, Error::EntryTooLarge { size: 1001, cap: 1000 }));
}

#[test]
fn s4_pin_blocks_fit() {
    let mgr = memory_manager(1000, Box::new(FifoPolicy::default()));
    mgr.set("a", 100).unwrap();
    mgr.register(&["a"]).unwrap();
    assert!(matches!(mgr.set("b", 950), Err(Error::NoEvictableEntry)));
}

#[test]
fn s5_once_materialize() {
    let mgr = memory_manager(100, Box::new(FifoPolicy::default()));
    mgr.set("k1", 40).unwrap();

    let mut producer_ran = false;
    let existing = mgr
        .once("k1", |_ctx| {
            producer_ran = true;
            unreachable!()
        })
        .unwrap();
    assert!(!producer_ran);
    assert_eq!(existing.size(), 40);

    let created = mgr.once("k2", |ctx| ctx.put("k2", 60)).unwrap();
    assert_eq!(created.size(), 60);
    assert_eq!(mgr.usage(), 100);
}

#[test]
fn s6_once_rollback() {
    let mgr = memory_manager(100, Box::new(FifoPolicy::default()));
    mgr.once("k", |ctx| {
        ctx.put("k", 10)?;
        ctx.rollback("k")?;
        Err(Error::NoEvictableEntry) // producer's own failure path
    })
    .unwrap_err();

    assert!(matches!(mgr.get("k"), Err(Error::NoSuchKey(_))));
}

#[test]
fn s7_policy_comparators_pick_opposite_ends() {
    let pool = fcache::pool::MetadataPool::new(Box::new(MemoryStore::new()), Box::new(RkyvCodec));
    for i in 0..10 {
        pool.put(&format!("key{i}"), 1).unwrap();
        std::thread::sleep(Duration::from_millis(2));
    }

    assert_eq!(FifoPolicy::default().evict(&pool).unwrap().key(), "key0");
    assert_eq!(LifoPolicy::default().evict(&pool).unwrap().key(), "key9");

    // Touch each key in order so last_used strictly increases.
    for i in 0..10 {
        let key = format!("key{i}");
        pool.incr_ref(&[key.as_str()]).unwrap();
        pool.decr_ref(&[key.as_str()]).unwrap();
        std::thread::sleep(Duration::from_millis(2));
    }
    assert_eq!(LruPolicy::default().evict(&pool).unwrap().key(), "key0");
    assert_eq!(MruPolicy::default().evict(&pool).unwrap().key(), "key9");
}

#[test]
fn s8_retry_terminates_when_no_victim_exists() {
    let impossible = FifoPolicy::new(ValidityOptions::new().allow_referenced().min_used(u32::MAX));
    let mgr = CacheManager::new(
        CacheManagerOptions::new(
            100,
            Box::new(MemoryStore::new()),
            Box::new(RkyvCodec),
            Box::new(impossible),
            Box::new(FakeFileStore::new()),
        )
        .with_retry(RetryOptions::fixed(10, Duration::from_millis(1))),
    )
    .unwrap();

    mgr.set("a", 100).unwrap();
    let start = std::time::Instant::now();
    assert!(matches!(mgr.set("b", 50), Err(Error::NoEvictableEntry)));
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[test]
fn sled_backend_recovers_usage_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("pool.sled");

    {
        let mgr = CacheManager::new(CacheManagerOptions::new(
            1000,
            Box::new(SledStore::open(&db_path).unwrap()),
            Box::new(RkyvCodec),
            Box::new(FifoPolicy::default()),
            Box::new(FakeFileStore::new()),
        ))
        .unwrap();
        mgr.set("a", 300).unwrap();
        mgr.close().unwrap();
    }

    let reopened = CacheManager::new(CacheManagerOptions::new(
        1000,
        Box::new(SledStore::open(&db_path).unwrap()),
        Box::new(RkyvCodec),
        Box::new(FifoPolicy::default()),
        Box::new(FakeFileStore::new()),
    ))
    .unwrap();
    assert_eq!(reopened.usage(), 300);
    assert_eq!(reopened.get("a").unwrap().size(), 300);
}

/// Property-based smoke test: under a randomized sequence of set/register/
/// unregister operations, the universal invariants from spec section 8
/// must hold at every quiescent point (after each operation, since the
/// manager never leaves its lock held between calls).
#[test]
fn randomized_operations_preserve_capacity_and_usage_invariants() {
    let cap = 500u64;
    let mgr = memory_manager(cap, Box::new(LruPolicy::default()));
    let mut rng = StdRng::seed_from_u64(7);
    let mut known_keys = Vec::new();

    for i in 0..500 {
        let choice = rng.gen_range(0..3);
        match choice {
            0 => {
                let key = format!("k{}", rng.gen_range(0..20));
                let size = rng.gen_range(0..=100);
                if mgr.set(&key, size).is_ok() {
                    known_keys.push(key);
                }
            }
            1 => {
                if let Some(key) = known_keys.get(i % known_keys.len().max(1)) {
                    let _ = mgr.register(&[key.as_str()]);
                }
            }
            _ => {
                if let Some(key) = known_keys.get(i % known_keys.len().max(1)) {
                    let _ = mgr.unregister(&[key.as_str()]);
                }
            }
        }

        // Invariant 1: capacity bound.
        assert!(mgr.usage() <= cap, "usage {} exceeded cap {}", mgr.usage(), cap);
    }

    // Invariant 2: usage equals the sum of real entry sizes.
    let mut summed = 0u64;
    for key in known_keys.iter().collect::<std::collections::HashSet<_>>() {
        if let Ok(entry) = mgr.get(key) {
            if entry.is_real() {
                summed += entry.size();
            }
        }
    }
    assert_eq!(summed, mgr.usage());
}
