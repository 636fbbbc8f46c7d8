use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;

use crate::error::Result;

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Time source for TTL checks; swapped for a manual clock in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

// ---------------------------------------------------------------------------
// CacheEntry
// ---------------------------------------------------------------------------

/// One successful fetch. Entries are immutable; a refresh swaps in a new `Arc`.
#[derive(Debug)]
pub struct CacheEntry<V> {
    pub value: V,
    pub fetched_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.fetched_at) < ttl
    }
}

// ---------------------------------------------------------------------------
// ResponseCache
// ---------------------------------------------------------------------------

/// Holds the latest successful upstream fetch per key.
///
/// Reads clone the entry's `Arc` under a shard read lock. The fetch runs with
/// no lock held, so concurrent misses on one key may each fetch; the last
/// insert wins. Failed fetches are not stored.
pub struct ResponseCache<K, V> {
    entries: DashMap<K, Arc<CacheEntry<V>>>,
    clock: Arc<dyn Clock>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<K, V> ResponseCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
{
    pub fn new() -> Arc<Self> {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Arc<Self> {
        Arc::new(Self {
            entries: DashMap::new(),
            clock,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }

    /// Return the entry for `key` if it was fetched less than `ttl` ago,
    /// otherwise call `fetch`, store its value and return the new entry.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        key: K,
        ttl: Duration,
        fetch: F,
    ) -> Result<Arc<CacheEntry<V>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        let cached = self.entries.get(&key).map(|e| Arc::clone(e.value()));
        if let Some(entry) = cached {
            if entry.is_fresh(self.clock.now(), ttl) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key = ?key, "response cache hit");
                return Ok(entry);
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(key = ?key, "response cache miss");

        let value = fetch().await?;
        let entry = Arc::new(CacheEntry {
            value,
            fetched_at: self.clock.now(),
        });
        self.entries.insert(key, Arc::clone(&entry));
        Ok(entry)
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    /// Clock that only moves when told to.
    struct ManualClock {
        base: Instant,
        offset: Mutex<Duration>,
    }

    impl ManualClock {
        fn new() -> Arc<Self> {
            Arc::new(Self { base: Instant::now(), offset: Mutex::new(Duration::ZERO) })
        }

        fn advance(&self, by: Duration) {
            *self.offset.lock().unwrap() += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            self.base + *self.offset.lock().unwrap()
        }
    }

    const TTL: Duration = Duration::from_secs(300);

    async fn counted_fetch(calls: &AtomicUsize) -> Result<Vec<u32>> {
        let n = calls.fetch_add(1, Ordering::SeqCst) as u32;
        Ok(vec![n])
    }

    #[tokio::test]
    async fn hit_within_ttl_returns_same_entry() {
        let clock = ManualClock::new();
        let cache: Arc<ResponseCache<String, Vec<u32>>> = ResponseCache::with_clock(clock.clone());
        let calls = AtomicUsize::new(0);

        let first = cache.get_or_fetch("nba".into(), TTL, || counted_fetch(&calls)).await.unwrap();
        clock.advance(Duration::from_secs(299));
        let second = cache.get_or_fetch("nba".into(), TTL, || counted_fetch(&calls)).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first.fetched_at, second.fetched_at);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
    }

    #[tokio::test]
    async fn expired_entry_is_refetched() {
        let clock = ManualClock::new();
        let cache: Arc<ResponseCache<String, Vec<u32>>> = ResponseCache::with_clock(clock.clone());
        let calls = AtomicUsize::new(0);

        let first = cache.get_or_fetch("nba".into(), TTL, || counted_fetch(&calls)).await.unwrap();
        clock.advance(TTL);
        let second = cache.get_or_fetch("nba".into(), TTL, || counted_fetch(&calls)).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(second.fetched_at > first.fetched_at);
        assert_eq!(second.value, vec![1]);
        // The old entry is untouched by the refresh.
        assert_eq!(first.value, vec![0]);
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let cache: Arc<ResponseCache<String, Vec<u32>>> = ResponseCache::with_clock(ManualClock::new());
        let calls = AtomicUsize::new(0);

        cache.get_or_fetch("nba".into(), TTL, || counted_fetch(&calls)).await.unwrap();
        cache.get_or_fetch("nfl".into(), TTL, || counted_fetch(&calls)).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn failed_fetch_is_not_cached() {
        let cache: Arc<ResponseCache<String, Vec<u32>>> = ResponseCache::with_clock(ManualClock::new());
        let calls = AtomicUsize::new(0);

        let err = cache
            .get_or_fetch("nba".into(), TTL, || async {
                Err(AppError::UpstreamUnreachable {
                    provider: "gamma".into(),
                    message: "connection reset".into(),
                })
            })
            .await;
        assert!(err.is_err());
        assert_eq!(cache.len(), 0);

        let ok = cache.get_or_fetch("nba".into(), TTL, || counted_fetch(&calls)).await.unwrap();
        assert_eq!(ok.value, vec![0]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
