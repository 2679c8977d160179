//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the freshness, eviction and fallback rules against
//! simulated time.

use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::cache::{CacheStore, ManualClock, SharedCache};

// == Test Configuration ==
const TEST_START_MS: u64 = 1_700_000_000_000;
const TEST_DEFAULT_TTL: u64 = 300_000;

fn test_store() -> (CacheStore<String, ManualClock>, ManualClock) {
    let clock = ManualClock::new(TEST_START_MS);
    (CacheStore::with_clock(TEST_DEFAULT_TTL, clock.clone()), clock)
}

// == Strategies ==
/// Generates cache keys
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9-]{1,24}".prop_map(|s| s)
}

/// Generates payloads
fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,64}".prop_map(|s| s)
}

/// Generates a sequence of cache operations interleaved with clock moves
#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: String, ttl: u64 },
    Get { key: String },
    Delete { key: String },
    Advance { ms: u64 },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), value_strategy(), 0u64..5_000)
            .prop_map(|(key, value, ttl)| CacheOp::Set { key, value, ttl }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
        key_strategy().prop_map(|key| CacheOp::Delete { key }),
        (0u64..3_000).prop_map(|ms| CacheOp::Advance { ms }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Set followed immediately by get returns the stored payload.
    #[test]
    fn prop_roundtrip_storage(
        key in key_strategy(),
        value in value_strategy(),
        ttl in 1u64..u32::MAX as u64
    ) {
        let (mut store, _) = test_store();

        store.set(key.clone(), value.clone(), Some(ttl));

        prop_assert_eq!(store.get(&key), Some(value));
    }

    // A zero TTL is never served fresh and the read evicts it.
    #[test]
    fn prop_zero_ttl_evicts(key in key_strategy(), value in value_strategy()) {
        let (mut store, _) = test_store();

        store.set(key.clone(), value, Some(0));

        prop_assert_eq!(store.get(&key), None);
        prop_assert!(!store.has(&key));
    }

    // Past the TTL an entry is stale, still readable through the stale path,
    // and evicted by the fresh-only read.
    #[test]
    fn prop_stale_after_ttl(
        key in key_strategy(),
        value in value_strategy(),
        ttl in 1u64..100_000,
        overshoot in 1u64..100_000
    ) {
        let (mut store, clock) = test_store();

        store.set(key.clone(), value.clone(), Some(ttl));
        clock.advance(ttl);
        prop_assert!(!store.is_stale(&key), "entry must be fresh at exactly ttl");

        clock.advance(overshoot);
        prop_assert!(store.is_stale(&key));
        prop_assert_eq!(store.get_stale(&key), Some(&value));
        prop_assert_eq!(store.get(&key), None);
        prop_assert!(!store.has(&key));
    }

    // Stats always partition the store into fresh and stale entries.
    #[test]
    fn prop_stats_partition(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let (mut store, clock) = test_store();
        let mut live: HashSet<String> = HashSet::new();

        for op in ops {
            match op {
                CacheOp::Set { key, value, ttl } => {
                    store.set(key.clone(), value, Some(ttl));
                    live.insert(key);
                }
                CacheOp::Get { key } => {
                    if store.get(&key).is_none() {
                        live.remove(&key);
                    }
                }
                CacheOp::Delete { key } => {
                    prop_assert_eq!(store.delete(&key), live.remove(&key));
                }
                CacheOp::Advance { ms } => clock.advance(ms),
            }

            let stats = store.stats();
            prop_assert_eq!(stats.valid + stats.stale, stats.total);
            prop_assert_eq!(stats.total, live.len());
        }
    }

    // Pattern invalidation removes exactly the keys containing the pattern.
    #[test]
    fn prop_invalidate_substring(
        keys in prop::collection::hash_set(key_strategy(), 1..20),
        pattern in "[a-z0-9-]{1,3}"
    ) {
        let (mut store, _) = test_store();
        for key in &keys {
            store.set(key.clone(), String::new(), None);
        }

        let expected = keys.iter().filter(|k| k.contains(pattern.as_str())).count();
        let removed = store.invalidate(Some(pattern.as_str()));

        prop_assert_eq!(removed, expected);
        for key in &keys {
            prop_assert_eq!(store.has(key), !key.contains(pattern.as_str()));
        }
    }
}

// Fetch-with-fallback properties, driven on a current-thread runtime
proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    // Within the TTL the fetch runs once, however many reads follow.
    #[test]
    fn prop_fetch_once_within_ttl(
        value in value_strategy(),
        ttl in 1u64..100_000,
        reads in 1usize..10
    ) {
        let clock = ManualClock::new(TEST_START_MS);
        let cache = SharedCache::from_store(CacheStore::with_clock(TEST_DEFAULT_TTL, clock));
        let calls = AtomicUsize::new(0);
        let calls = &calls;

        for _ in 0..reads {
            let got = tokio_test::block_on(cache.get_cached_data(
                "feed",
                || {
                    let value = value.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, String>(value)
                    }
                },
                Some(ttl),
            ));
            prop_assert_eq!(got, Ok(value.clone()));
        }

        prop_assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    // Once fetched, a failing origin never surfaces an error for that key.
    #[test]
    fn prop_stale_fallback_absorbs_failure(
        value in value_strategy(),
        ttl in 1u64..100_000,
        elapsed in 0u64..1_000_000
    ) {
        let clock = ManualClock::new(TEST_START_MS);
        let cache = SharedCache::from_store(CacheStore::with_clock(TEST_DEFAULT_TTL, clock.clone()));

        let first = value.clone();
        let seeded = tokio_test::block_on(
            cache.get_cached_data("feed", || async move { Ok::<_, String>(first) }, Some(ttl)),
        );
        prop_assert!(seeded.is_ok());

        clock.advance(elapsed);
        let got = tokio_test::block_on(cache.get_cached_data(
            "feed",
            || async { Err::<String, _>("origin down".to_string()) },
            Some(ttl),
        ));
        prop_assert_eq!(got, Ok(value));
    }
}
