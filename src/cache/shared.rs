//! Shared Cache Handle
//!
//! Cloneable handle over a `CacheStore` that adds fetch-with-fallback and
//! pattern invalidation. Concurrent misses on one key share a single fetch
//! and its outcome.

use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{watch, RwLock};
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, CacheStore, Clock, SystemClock, DEFAULT_TTL_MS};

/// Fetches currently in progress, keyed by cache key.
///
/// Held only for map updates, never across an await.
type InFlight = Arc<Mutex<HashMap<String, Arc<watch::Sender<bool>>>>>;

// == Flight ==
/// Role of a caller that missed the cache.
enum Flight<'a> {
    /// Runs the fetch and publishes its outcome
    Leader(FlightGuard<'a>),
    /// Waits until the leader is done
    Follower(watch::Receiver<bool>),
}

/// Leader's hold on a key's flight.
///
/// On drop the flight leaves the map and its followers are woken, so a
/// cancelled leader never strands them.
struct FlightGuard<'a> {
    in_flight: &'a InFlight,
    key: String,
    tx: Arc<watch::Sender<bool>>,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            if in_flight
                .get(&self.key)
                .is_some_and(|tx| Arc::ptr_eq(tx, &self.tx))
            {
                in_flight.remove(&self.key);
            }
        }
        self.tx.send_replace(true);
    }
}

// == Shared Cache ==
/// Thread-safe cache handle shared across request handlers.
///
/// Clones refer to the same store.
pub struct SharedCache<T, C = SystemClock> {
    store: Arc<RwLock<CacheStore<T, C>>>,
    in_flight: InFlight,
}

impl<T, C> Clone for SharedCache<T, C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

impl<T> SharedCache<T, SystemClock> {
    /// Creates an empty cache on wall-clock time.
    pub fn new(default_ttl: u64) -> Self {
        Self::from_store(CacheStore::new(default_ttl))
    }
}

impl<T> Default for SharedCache<T, SystemClock> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL_MS)
    }
}

impl<T, C> SharedCache<T, C> {
    /// Wraps an existing store.
    pub fn from_store(store: CacheStore<T, C>) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The underlying store, for direct reads and writes.
    pub fn store(&self) -> &Arc<RwLock<CacheStore<T, C>>> {
        &self.store
    }

    /// Number of keys with a fetch currently in progress.
    pub fn in_flight_len(&self) -> usize {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn join_flight(&self, key: &str) -> Flight<'_> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(tx) = in_flight.get(key) {
            return Flight::Follower(tx.subscribe());
        }

        let tx = Arc::new(watch::channel(false).0);
        in_flight.insert(key.to_string(), Arc::clone(&tx));
        Flight::Leader(FlightGuard {
            in_flight: &self.in_flight,
            key: key.to_string(),
            tx,
        })
    }
}

impl<T, C> SharedCache<T, C>
where
    T: Clone,
    C: Clock,
{
    // == Get Cached Data ==
    /// Returns the cached value for `key`, fetching it on a miss.
    ///
    /// 1. A fresh entry is returned without calling `fetch_fn`. A stale entry
    ///    is not evicted here; it is kept as the fallback for step 3.
    /// 2. Otherwise `fetch_fn` runs. On success its value is stored with
    ///    `ttl` (store default if None) and returned.
    /// 3. On failure a stale entry, if any, is returned and the error is
    ///    logged. Without one the original error is returned unchanged.
    ///
    /// Callers that miss while another caller is fetching the same key wait
    /// for that fetch instead of starting their own, then read what it left:
    /// the fresh value on success, the stale entry on failure. Only when the
    /// shared fetch failed with nothing stale to fall back on does a waiter
    /// run its own `fetch_fn`, concurrently with the other waiters, so each
    /// gets an error of its own.
    ///
    /// Stale data returned here carries no marker; callers cannot tell it
    /// apart from a fresh fetch. No timeout is applied to `fetch_fn`.
    pub async fn get_cached_data<F, Fut, E>(
        &self,
        key: &str,
        fetch_fn: F,
        ttl: Option<u64>,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        if let Some(data) = self.fresh(key).await {
            debug!(key, "cache hit");
            return Ok(data);
        }

        let mut rx = match self.join_flight(key) {
            Flight::Leader(flight) => return self.lead_fetch(key, flight, fetch_fn, ttl).await,
            Flight::Follower(rx) => rx,
        };

        debug!(key, "waiting on in-flight fetch");
        // A dropped sender also means the leader is done
        let _ = rx.wait_for(|done| *done).await;

        if let Some(data) = self.fresh(key).await {
            return Ok(data);
        }
        if let Some(data) = self.stale(key).await {
            debug!(key, "in-flight fetch failed, serving stale data");
            return Ok(data);
        }

        self.fetch_and_store(key, fetch_fn, ttl).await
    }

    async fn lead_fetch<F, Fut, E>(
        &self,
        key: &str,
        flight: FlightGuard<'_>,
        fetch_fn: F,
        ttl: Option<u64>,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        // A previous leader may have stored the key since our first check
        if let Some(data) = self.fresh(key).await {
            return Ok(data);
        }

        let result = self.fetch_and_store(key, fetch_fn, ttl).await;
        drop(flight);
        result
    }

    /// Runs `fetch_fn`; stores the value or falls back to stale data.
    async fn fetch_and_store<F, Fut, E>(
        &self,
        key: &str,
        fetch_fn: F,
        ttl: Option<u64>,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        debug!(key, "cache miss, fetching");
        match fetch_fn().await {
            Ok(data) => {
                self.store.write().await.set(key, data.clone(), ttl);
                Ok(data)
            }
            Err(err) => match self.stale(key).await {
                Some(data) => {
                    warn!(key, error = %err, "using stale cache data due to fetch error");
                    Ok(data)
                }
                None => Err(err),
            },
        }
    }

    /// Fresh-only read. Stale entries stay put as fallback candidates.
    async fn fresh(&self, key: &str) -> Option<T> {
        self.store.read().await.peek_fresh(key).cloned()
    }

    async fn stale(&self, key: &str) -> Option<T> {
        self.store.read().await.get_stale(key).cloned()
    }

    // == Invalidate Cache ==
    /// Deletes keys containing `pattern`, or the whole store if None.
    ///
    /// Returns the number of entries removed.
    pub async fn invalidate_cache(&self, pattern: Option<&str>) -> usize {
        let removed = self.store.write().await.invalidate(pattern);
        info!(pattern = pattern.unwrap_or("*"), removed, "cache invalidated");
        removed
    }

    // == Stats ==
    /// Returns a fresh/stale breakdown of stored entries.
    pub async fn stats(&self) -> CacheStats {
        self.store.read().await.stats()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn test_cache() -> (SharedCache<String, ManualClock>, ManualClock) {
        let clock = ManualClock::new(1_000_000);
        let store = CacheStore::with_clock(DEFAULT_TTL_MS, clock.clone());
        (SharedCache::from_store(store), clock)
    }

    #[tokio::test]
    async fn test_fetch_success_is_cached() {
        let (cache, _) = test_cache();
        let calls = AtomicUsize::new(0);
        let calls = &calls;

        for _ in 0..3 {
            let value = cache
                .get_cached_data(
                    "feed",
                    || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, String>("payload".to_string())
                    },
                    Some(1_000),
                )
                .await
                .unwrap();
            assert_eq!(value, "payload");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_is_refetched() {
        let (cache, clock) = test_cache();

        cache
            .get_cached_data("feed", || async { Ok::<_, String>("v1".to_string()) }, Some(1_000))
            .await
            .unwrap();
        clock.advance(1_001);

        let value = cache
            .get_cached_data("feed", || async { Ok::<_, String>("v2".to_string()) }, Some(1_000))
            .await
            .unwrap();
        assert_eq!(value, "v2");
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_stale() {
        let (cache, clock) = test_cache();

        cache
            .get_cached_data("feed", || async { Ok::<_, String>("good".to_string()) }, Some(1_000))
            .await
            .unwrap();

        clock.advance(1_001);
        let result = cache
            .get_cached_data(
                "feed",
                || async { Err::<String, _>("upstream down".to_string()) },
                Some(1_000),
            )
            .await;

        assert_eq!(result, Ok("good".to_string()));
        // The stale entry survives for the next outage
        assert!(cache.store().read().await.has("feed"));
    }

    #[tokio::test]
    async fn test_failure_without_fallback_propagates() {
        let (cache, _) = test_cache();

        let result = cache
            .get_cached_data(
                "feed",
                || async { Err::<String, _>("upstream down".to_string()) },
                None,
            )
            .await;

        assert_eq!(result, Err("upstream down".to_string()));
        assert_eq!(cache.in_flight_len(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_misses_share_one_fetch() {
        let (cache, _) = test_cache();
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                cache
                    .get_cached_data(
                        "feed",
                        move || async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(50)).await;
                            Ok::<_, String>("shared".to_string())
                        },
                        Some(60_000),
                    )
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), Ok("shared".to_string()));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.in_flight_len(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_failures_share_stale_fallback() {
        let (cache, clock) = test_cache();
        cache
            .store()
            .write()
            .await
            .set("feed", "good".to_string(), Some(1_000));
        clock.advance(1_001);

        let calls = Arc::new(AtomicUsize::new(0));
        let started = tokio::time::Instant::now();
        let mut handles = Vec::new();
        for _ in 0..5 {
            let cache = cache.clone();
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                cache
                    .get_cached_data(
                        "feed",
                        move || async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(200)).await;
                            Err::<String, _>("upstream down".to_string())
                        },
                        Some(1_000),
                    )
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), Ok("good".to_string()));
        }
        // One failed fetch answers every waiter; queued retries would take 1s
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(started.elapsed() < Duration::from_millis(600));
        assert_eq!(cache.in_flight_len(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_hard_failures_retry_in_parallel() {
        let (cache, _) = test_cache();
        let calls = Arc::new(AtomicUsize::new(0));

        let started = tokio::time::Instant::now();
        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                cache
                    .get_cached_data(
                        "feed",
                        move || async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(100)).await;
                            Err::<String, _>("upstream down".to_string())
                        },
                        None,
                    )
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), Err("upstream down".to_string()));
        }
        // The leader's fetch, then one parallel round for the waiters
        assert_eq!(calls.load(Ordering::SeqCst), 8);
        assert!(started.elapsed() < Duration::from_millis(500));
        assert_eq!(cache.in_flight_len(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_leader_releases_waiters() {
        let (cache, _) = test_cache();

        let leader = {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache
                    .get_cached_data(
                        "feed",
                        || std::future::pending::<Result<String, String>>(),
                        None,
                    )
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(cache.in_flight_len(), 1);

        let waiter = {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache
                    .get_cached_data("feed", || async { Ok::<_, String>("late".to_string()) }, None)
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        leader.abort();

        let result = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter stayed blocked")
            .unwrap();
        assert_eq!(result, Ok("late".to_string()));
        assert_eq!(cache.in_flight_len(), 0);
    }

    #[tokio::test]
    async fn test_invalidate_cache() {
        let (cache, _) = test_cache();
        {
            let mut store = cache.store().write().await;
            store.set("kcm-feed", "1".to_string(), None);
            store.set("kcm-articles", "2".to_string(), None);
            store.set("market-insights", "3".to_string(), None);
        }

        assert_eq!(cache.invalidate_cache(Some("kcm")).await, 2);
        assert_eq!(cache.stats().await.total, 1);

        assert_eq!(cache.invalidate_cache(None).await, 1);
        assert_eq!(cache.stats().await.total, 0);
    }
}
