//! TTL cache keyed by source identifier
//!
//! Provides a `TtlCache` that stores the last successful result of a fetch
//! function together with the time it was fetched, and re-runs the fetch only
//! once the entry has expired. Callers depend on the `Cache` trait so another
//! store can stand in for it.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{debug, warn};

/// Source of the current time for expiry checks
pub trait Clock: Send + Sync {
    /// Returns the current instant
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to
///
/// Lets tests step past a TTL boundary without sleeping.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Moves the clock forward by `delta`
    pub fn advance(&self, delta: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += delta;
    }

    /// Jumps the clock to `instant`
    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = instant;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Result of peeking into the cache, including metadata about freshness
#[derive(Debug, Clone)]
pub struct CachedData<T> {
    /// The cached value
    pub data: T,
    /// When the value was fetched
    pub cached_at: DateTime<Utc>,
    /// Whether the entry has expired
    pub is_expired: bool,
}

/// Keyed store of fetched values with a per-entry lifetime
///
/// Implementations must replace entries whole so a reader sees either the old
/// value or the new one.
pub trait Cache<T>: Send + Sync {
    /// Returns the value for `key` if it has not expired
    fn fresh(&self, key: &str) -> Option<T>;

    /// Reads the entry for `key` regardless of freshness
    fn peek(&self, key: &str) -> Option<CachedData<T>>;

    /// Stores `value` under `key`, fetched now
    fn insert(&self, key: &str, value: T, ttl: Duration);

    /// Drops the entry for `key` so the next read fetches
    fn invalidate(&self, key: &str);
}

/// Returns the fresh value for `key`, or runs `fetch` and stores its result
///
/// # Arguments
/// * `cache` - Store consulted first and written on success
/// * `key` - Source identifier (e.g., the dataset URL)
/// * `ttl` - How long a newly fetched value stays fresh
/// * `fetch` - Produces the value when the entry is missing or expired
///
/// # Returns
/// * `Ok(T)` - The cached or freshly fetched value
/// * `Err(E)` - The fetch failed; the cache is left untouched
pub async fn get_or_fetch<C, T, F, Fut, E>(
    cache: &C,
    key: &str,
    ttl: Duration,
    fetch: F,
) -> Result<T, E>
where
    C: Cache<T> + ?Sized,
    T: Clone,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    if let Some(value) = cache.fresh(key) {
        debug!(key, "cache hit");
        return Ok(value);
    }

    debug!(key, "cache miss, fetching");
    let value = fetch().await?;
    cache.insert(key, value.clone(), ttl);
    Ok(value)
}

/// Like `get_or_fetch`, but serves an expired entry when the refetch fails
///
/// The error is returned only when nothing was ever stored under `key`.
pub async fn get_or_stale<C, T, F, Fut, E>(
    cache: &C,
    key: &str,
    ttl: Duration,
    fetch: F,
) -> Result<T, E>
where
    C: Cache<T> + ?Sized,
    T: Clone,
    E: Display,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    match get_or_fetch(cache, key, ttl, fetch).await {
        Ok(value) => Ok(value),
        Err(e) => match cache.peek(key) {
            Some(stale) => {
                warn!(
                    key,
                    error = %e,
                    cached_at = %stale.cached_at,
                    "Refresh failed, serving stale value"
                );
                Ok(stale.data)
            }
            None => Err(e),
        },
    }
}

/// A stored value with its fetch time and lifetime
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    /// The cached value
    value: T,
    /// When the value was fetched
    fetched_at: DateTime<Utc>,
    /// How long the value stays fresh
    ttl: Duration,
}

impl<T> CacheEntry<T> {
    /// An entry is expired at or after `fetched_at + ttl`
    ///
    /// A lifetime too long to represent never expires.
    fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.fetched_at
            .checked_add_signed(self.ttl)
            .map_or(false, |expiry| now >= expiry)
    }
}

/// Memoizes fetch results per key for a time-to-live window
///
/// Every write replaces the whole entry under a lock, so readers never observe
/// a partially written value. The lock is never held while a fetch runs:
/// concurrent readers racing an expiry may each run the fetch, and the last
/// successful write wins.
pub struct TtlCache<T> {
    /// Time source for expiry decisions
    clock: Arc<dyn Clock>,
    /// Entries keyed by source identifier
    entries: RwLock<HashMap<String, CacheEntry<T>>>,
}

impl<T: Clone + Send + Sync> Default for TtlCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync> TtlCache<T> {
    /// Creates an empty cache driven by the system clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty cache driven by a custom clock
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the fresh value for `key`, or runs `fetch` and stores its result
    ///
    /// See `get_or_fetch`.
    pub async fn get<F, Fut, E>(&self, key: &str, ttl: Duration, fetch: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        get_or_fetch(self, key, ttl, fetch).await
    }

    /// Drops every entry
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl<T: Clone + Send + Sync> Cache<T> for TtlCache<T> {
    fn fresh(&self, key: &str) -> Option<T> {
        let now = self.clock.now();
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(key)
            .filter(|entry| !entry.is_expired_at(now))
            .map(|entry| entry.value.clone())
    }

    fn peek(&self, key: &str) -> Option<CachedData<T>> {
        let now = self.clock.now();
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).map(|entry| CachedData {
            data: entry.value.clone(),
            cached_at: entry.fetched_at,
            is_expired: entry.is_expired_at(now),
        })
    }

    fn insert(&self, key: &str, value: T, ttl: Duration) {
        let entry = CacheEntry {
            value,
            fetched_at: self.clock.now(),
            ttl,
        };
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), entry);
    }

    fn invalidate(&self, key: &str) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq)]
    struct TestData {
        name: String,
        value: i32,
    }

    fn create_test_cache() -> (TtlCache<TestData>, Arc<ManualClock>) {
        let start = Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let cache = TtlCache::with_clock(clock.clone());
        (cache, clock)
    }

    /// Returns a fetch function that counts its invocations
    fn counting_fetch(
        calls: &AtomicUsize,
        value: i32,
    ) -> impl FnOnce() -> std::future::Ready<Result<TestData, String>> + '_ {
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Ok(TestData {
                name: "fetched".to_string(),
                value,
            }))
        }
    }

    #[tokio::test]
    async fn test_first_get_invokes_fetch() {
        let (cache, _clock) = create_test_cache();
        let calls = AtomicUsize::new(0);

        let result = cache
            .get("key", Duration::minutes(10), counting_fetch(&calls, 1))
            .await
            .expect("Fetch should succeed");

        assert_eq!(result.value, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_read_just_before_expiry_is_served_from_cache() {
        let (cache, clock) = create_test_cache();
        let calls = AtomicUsize::new(0);
        let ttl = Duration::minutes(10);

        let first = cache.get("key", ttl, counting_fetch(&calls, 1)).await.unwrap();
        clock.advance(ttl - Duration::milliseconds(1));
        let second = cache.get("key", ttl, counting_fetch(&calls, 2)).await.unwrap();

        assert_eq!(first, second, "Value should be identical before expiry");
        assert_eq!(calls.load(Ordering::SeqCst), 1, "Fetch should run once");
    }

    #[tokio::test]
    async fn test_read_at_expiry_refetches_exactly_once() {
        let (cache, clock) = create_test_cache();
        let calls = AtomicUsize::new(0);
        let ttl = Duration::minutes(10);

        cache.get("key", ttl, counting_fetch(&calls, 1)).await.unwrap();
        clock.advance(ttl);
        let refreshed = cache.get("key", ttl, counting_fetch(&calls, 2)).await.unwrap();
        let again = cache.get("key", ttl, counting_fetch(&calls, 3)).await.unwrap();

        assert_eq!(refreshed.value, 2);
        assert_eq!(again.value, 2, "Refetched value should be cached again");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_read_after_expiry_refetches() {
        let (cache, clock) = create_test_cache();
        let calls = AtomicUsize::new(0);
        let ttl = Duration::seconds(30);

        cache.get("key", ttl, counting_fetch(&calls, 1)).await.unwrap();
        clock.advance(ttl + Duration::milliseconds(1));
        let result = cache.get("key", ttl, counting_fetch(&calls, 2)).await.unwrap();

        assert_eq!(result.value, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let (cache, _clock) = create_test_cache();
        let calls = AtomicUsize::new(0);
        let ttl = Duration::minutes(10);

        let failed: Result<TestData, String> = cache
            .get("key", ttl, || async { Err("boom".to_string()) })
            .await;
        assert_eq!(failed, Err("boom".to_string()));
        assert!(cache.peek("key").is_none(), "Failure must not be stored");

        let result = cache.get("key", ttl, counting_fetch(&calls, 7)).await.unwrap();
        assert_eq!(result.value, 7, "Next read should retry the fetch");
    }

    #[tokio::test]
    async fn test_failed_refetch_keeps_previous_entry() {
        let (cache, clock) = create_test_cache();
        let calls = AtomicUsize::new(0);
        let ttl = Duration::minutes(10);

        cache.get("key", ttl, counting_fetch(&calls, 1)).await.unwrap();
        clock.advance(ttl);
        let failed: Result<TestData, String> = cache
            .get("key", ttl, || async { Err("offline".to_string()) })
            .await;
        assert!(failed.is_err());

        let stale = cache.peek("key").expect("Previous entry should survive");
        assert_eq!(stale.data.value, 1);
        assert!(stale.is_expired);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let (cache, _clock) = create_test_cache();
        let calls = AtomicUsize::new(0);
        let ttl = Duration::minutes(10);

        let a = cache.get("a", ttl, counting_fetch(&calls, 1)).await.unwrap();
        let b = cache.get("b", ttl, counting_fetch(&calls, 2)).await.unwrap();

        assert_eq!(a.value, 1);
        assert_eq!(b.value, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let (cache, _clock) = create_test_cache();
        let calls = AtomicUsize::new(0);
        let ttl = Duration::minutes(10);

        cache.get("key", ttl, counting_fetch(&calls, 1)).await.unwrap();
        cache.invalidate("key");
        let result = cache.get("key", ttl, counting_fetch(&calls, 2)).await.unwrap();

        assert_eq!(result.value, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_peek_returns_none_for_missing_key() {
        let (cache, _clock) = create_test_cache();
        assert!(cache.peek("nonexistent_key").is_none());
    }

    #[test]
    fn test_peek_reports_fetch_time_and_freshness() {
        let (cache, clock) = create_test_cache();
        let stored_at = clock.now();
        let data = TestData {
            name: "fresh".to_string(),
            value: 100,
        };

        cache.insert("fresh_key", data.clone(), Duration::hours(1));
        let fresh = cache.peek("fresh_key").expect("Entry should exist");
        assert_eq!(fresh.data, data);
        assert_eq!(fresh.cached_at, stored_at);
        assert!(!fresh.is_expired);

        clock.advance(Duration::hours(2));
        let expired = cache.peek("fresh_key").expect("Expired entry is still readable");
        assert!(expired.is_expired);
    }

    #[test]
    fn test_insert_overwrites_existing_entry() {
        let (cache, _clock) = create_test_cache();
        let first = TestData {
            name: "first".to_string(),
            value: 1,
        };
        let second = TestData {
            name: "second".to_string(),
            value: 2,
        };

        cache.insert("overwrite_key", first, Duration::hours(1));
        cache.insert("overwrite_key", second.clone(), Duration::hours(1));

        assert_eq!(cache.peek("overwrite_key").unwrap().data, second);
    }

    #[test]
    fn test_clear_drops_all_entries() {
        let (cache, _clock) = create_test_cache();
        let data = TestData {
            name: "x".to_string(),
            value: 0,
        };
        cache.insert("a", data.clone(), Duration::hours(1));
        cache.insert("b", data, Duration::hours(1));

        cache.clear();

        assert!(cache.peek("a").is_none());
        assert!(cache.peek("b").is_none());
    }

    #[test]
    fn test_manual_clock_set_and_advance() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let clock = ManualClock::new(start);

        clock.advance(Duration::seconds(90));
        assert_eq!(clock.now(), start + Duration::seconds(90));

        clock.set(start);
        assert_eq!(clock.now(), start);
    }

    #[tokio::test]
    async fn test_unrepresentable_ttl_never_expires() {
        let (cache, clock) = create_test_cache();
        let calls = AtomicUsize::new(0);
        let ttl = Duration::max_value();

        let first = cache.get("key", ttl, counting_fetch(&calls, 1)).await.unwrap();
        clock.advance(Duration::days(365 * 100));
        let second = cache.get("key", ttl, counting_fetch(&calls, 2)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1, "Fetch should run once");
        assert!(!cache.peek("key").unwrap().is_expired);
    }

    #[tokio::test]
    async fn test_get_or_stale_serves_expired_entry_on_failure() {
        let (cache, clock) = create_test_cache();
        let calls = AtomicUsize::new(0);
        let ttl = Duration::minutes(10);

        cache.get("key", ttl, counting_fetch(&calls, 1)).await.unwrap();
        clock.advance(ttl);
        let result: Result<TestData, String> =
            get_or_stale(&cache, "key", ttl, || async { Err("offline".to_string()) }).await;

        assert_eq!(result.unwrap().value, 1);
        assert!(cache.peek("key").unwrap().is_expired, "Stale entry is not refreshed");
    }

    #[tokio::test]
    async fn test_get_or_stale_returns_error_when_nothing_held() {
        let (cache, _clock) = create_test_cache();

        let result: Result<TestData, String> = get_or_stale(
            &cache,
            "key",
            Duration::minutes(10),
            || async { Err("offline".to_string()) },
        )
        .await;

        assert_eq!(result, Err("offline".to_string()));
    }

    /// A store that never holds anything
    struct NullCache;

    impl Cache<TestData> for NullCache {
        fn fresh(&self, _key: &str) -> Option<TestData> {
            None
        }

        fn peek(&self, _key: &str) -> Option<CachedData<TestData>> {
            None
        }

        fn insert(&self, _key: &str, _value: TestData, _ttl: Duration) {}

        fn invalidate(&self, _key: &str) {}
    }

    #[tokio::test]
    async fn test_get_or_fetch_works_through_trait_object() {
        let cache: Arc<dyn Cache<TestData>> = Arc::new(NullCache);
        let calls = AtomicUsize::new(0);
        let ttl = Duration::minutes(10);

        get_or_fetch(cache.as_ref(), "key", ttl, counting_fetch(&calls, 1))
            .await
            .unwrap();
        get_or_fetch(cache.as_ref(), "key", ttl, counting_fetch(&calls, 2))
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2, "Nothing is memoized");
    }
}
