//! The shared query cache.

use std::any::Any;
use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::sync::{Arc, Mutex as SyncMutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use apiq_core::CacheKey;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, warn};

use crate::retry::RetryPolicy;

/// Cache-wide defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryClientConfig {
    /// How long fetched data counts as fresh. Zero means every fetch goes
    /// to the network unless another fetch of the same key just finished.
    pub stale_time: Duration,
    /// Retry policy for query functions.
    pub retry: RetryPolicy,
}

impl QueryClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the freshness window.
    pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    /// Set the default retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

type ErasedData = Arc<dyn Any + Send + Sync>;

struct CacheEntry {
    data: ErasedData,
    updated_at: Instant,
    invalidated: bool,
}

impl CacheEntry {
    fn is_fresh(&self, stale_time: Duration) -> bool {
        !self.invalidated && self.updated_at.elapsed() < stale_time
    }
}

struct Inner {
    config: QueryClientConfig,
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    locks: SyncMutex<HashMap<CacheKey, Arc<Mutex<()>>>>,
}

impl Inner {
    fn locks(&self) -> MutexGuard<'_, HashMap<CacheKey, Arc<Mutex<()>>>> {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Exclusive hold on one cache key.
///
/// Dropping it unlocks the key and forgets the per-key mutex once nobody
/// else references it, including when the holding future is cancelled.
pub(crate) struct KeyGuard {
    guard: Option<OwnedMutexGuard<()>>,
    lock: Arc<Mutex<()>>,
    key: CacheKey,
    client: QueryClient,
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        self.guard.take();
        let mut locks = self.client.inner.locks();
        // The map's reference plus ours: nobody else is waiting.
        let unused = Arc::strong_count(&self.lock) == 2
            && locks.get(&self.key).is_some_and(|l| Arc::ptr_eq(l, &self.lock));
        if unused {
            locks.remove(&self.key);
        }
    }
}

/// Keyed store of query results shared by every query, infinite query and
/// mutation bound to it.
///
/// Cloning is cheap; clones share the same store.
#[derive(Clone)]
pub struct QueryClient {
    inner: Arc<Inner>,
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::new(QueryClientConfig::default())
    }
}

impl Debug for QueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl QueryClient {
    /// Create an empty cache.
    pub fn new(config: QueryClientConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                entries: RwLock::new(HashMap::new()),
                locks: SyncMutex::new(HashMap::new()),
            }),
        }
    }

    pub fn config(&self) -> &QueryClientConfig {
        &self.inner.config
    }

    /// Cached data for `key`, fresh or not.
    ///
    /// `None` when nothing is cached or the cached value has another type.
    pub async fn get_query_data<T: Send + Sync + 'static>(&self, key: &CacheKey) -> Option<Arc<T>> {
        let entries = self.inner.entries.read().await;
        entries.get(key).and_then(|entry| downcast(&entry.data))
    }

    /// Store `data` under `key` as freshly fetched.
    pub async fn set_query_data<T: Send + Sync + 'static>(&self, key: &CacheKey, data: T) -> Arc<T> {
        self.store(key, Arc::new(data)).await
    }

    pub(crate) async fn store<T: Send + Sync + 'static>(&self, key: &CacheKey, data: Arc<T>) -> Arc<T> {
        let mut entries = self.inner.entries.write().await;
        entries.insert(
            key.clone(),
            CacheEntry {
                data: data.clone(),
                updated_at: Instant::now(),
                invalidated: false,
            },
        );
        data
    }

    /// Whether `key` would be refetched: missing, invalidated or past its
    /// freshness window.
    pub async fn is_stale(&self, key: &CacheKey) -> bool {
        let entries = self.inner.entries.read().await;
        entries
            .get(key)
            .map(|entry| !entry.is_fresh(self.inner.config.stale_time))
            .unwrap_or(true)
    }

    /// Mark every entry whose key starts with `prefix` as stale.
    ///
    /// Data stays readable; the next fetch of each key goes to the network.
    /// Returns the number of entries marked.
    pub async fn invalidate_queries(&self, prefix: &CacheKey) -> usize {
        let mut entries = self.inner.entries.write().await;
        let mut count = 0;
        for (key, entry) in entries.iter_mut() {
            if key.starts_with(prefix) {
                entry.invalidated = true;
                count += 1;
            }
        }
        debug!(prefix = %prefix, count, "Invalidated queries");
        count
    }

    /// Drop every entry whose key starts with `prefix`. Returns the number removed.
    pub async fn remove_queries(&self, prefix: &CacheKey) -> usize {
        let mut entries = self.inner.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        before - entries.len()
    }

    /// All cached keys, in canonical order.
    pub async fn keys(&self) -> Vec<CacheKey> {
        let entries = self.inner.entries.read().await;
        let mut keys: Vec<CacheKey> = entries.keys().cloned().collect();
        keys.sort_by_key(|k| k.canonical());
        keys
    }

    /// Fresh cached data for `key`, or the result of `fetcher`.
    ///
    /// Uses the client's stale time and retry policy. Concurrent calls for
    /// the same key run `fetcher` once; later callers read what the first
    /// one stored.
    pub async fn fetch_query<T, E, F, Fut>(&self, key: &CacheKey, fetcher: F) -> Result<Arc<T>, E>
    where
        T: Send + Sync + 'static,
        E: Debug,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let retry = self.inner.config.retry.clone();
        self.fetch_with(key, self.inner.config.stale_time, &retry, false, fetcher)
            .await
            .map_err(|(err, _)| err)
    }

    pub(crate) async fn fetch_with<T, E, F, Fut>(
        &self,
        key: &CacheKey,
        stale_time: Duration,
        retry: &RetryPolicy,
        force: bool,
        fetcher: F,
    ) -> Result<Arc<T>, (E, u32)>
    where
        T: Send + Sync + 'static,
        E: Debug,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let started = Instant::now();
        if !force {
            if let Some(data) = self.lookup(key, |entry| entry.is_fresh(stale_time)).await {
                debug!(key = %key, "Cache hit");
                return Ok(data);
            }
        }

        let _guard = self.lock_key(key).await;
        // Someone else may have finished this key while we waited.
        let deduped = self
            .lookup(key, |entry| !entry.invalidated && entry.updated_at >= started)
            .await;
        if let Some(data) = deduped {
            debug!(key = %key, "Reusing concurrent fetch");
            return Ok(data);
        }

        debug!(key = %key, "Fetching");
        match retry.run(fetcher).await {
            Ok(value) => Ok(self.store(key, Arc::new(value)).await),
            Err((err, failures)) => {
                warn!(key = %key, failures, error = ?err, "Fetch failed");
                Err((err, failures))
            }
        }
    }

    async fn lookup<T: Send + Sync + 'static>(
        &self,
        key: &CacheKey,
        accept: impl Fn(&CacheEntry) -> bool,
    ) -> Option<Arc<T>> {
        let entries = self.inner.entries.read().await;
        entries
            .get(key)
            .filter(|entry| accept(entry))
            .and_then(|entry| downcast(&entry.data))
    }

    /// Wait for exclusive access to `key`.
    pub(crate) async fn lock_key(&self, key: &CacheKey) -> KeyGuard {
        let lock = {
            let mut locks = self.inner.locks();
            // Entries left behind by waiters that were dropped before
            // acquiring are referenced by the map alone.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(key.clone()).or_default().clone()
        };
        let mut guard = KeyGuard {
            guard: None,
            lock: lock.clone(),
            key: key.clone(),
            client: self.clone(),
        };
        guard.guard = Some(lock.lock_owned().await);
        guard
    }
}

fn downcast<T: Send + Sync + 'static>(data: &ErasedData) -> Option<Arc<T>> {
    data.clone().downcast::<T>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn key(path: &str) -> CacheKey {
        CacheKey::identity("test", path)
    }

    #[tokio::test]
    async fn test_set_and_get_query_data() {
        let client = QueryClient::default();
        client.set_query_data(&key("/users"), vec![1, 2, 3]).await;

        let data: Arc<Vec<i32>> = client.get_query_data(&key("/users")).await.unwrap();
        assert_eq!(*data, vec![1, 2, 3]);
        assert!(client.get_query_data::<String>(&key("/users")).await.is_none());
        assert!(client.get_query_data::<Vec<i32>>(&key("/other")).await.is_none());
    }

    #[tokio::test]
    async fn test_fetch_query_uses_fresh_data() {
        let client = QueryClient::new(QueryClientConfig::new().with_stale_time(Duration::from_secs(60)));
        let calls = &AtomicU32::new(0);
        for _ in 0..3 {
            let data: Arc<u32> = client
                .fetch_query(&key("/users"), || async move {
                    Ok::<_, String>(calls.fetch_add(1, Ordering::SeqCst))
                })
                .await
                .unwrap();
            assert_eq!(*data, 0);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_stale_time_refetches() {
        let client = QueryClient::default();
        let calls = &AtomicU32::new(0);
        for _ in 0..2 {
            client
                .fetch_query(&key("/users"), || async move {
                    Ok::<_, String>(calls.fetch_add(1, Ordering::SeqCst))
                })
                .await
                .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_fetches_are_deduplicated() {
        let client = QueryClient::default();
        let calls = Arc::new(AtomicU32::new(0));

        let fetch = |client: QueryClient, calls: Arc<AtomicU32>| async move {
            client
                .fetch_query(&key("/users"), || {
                    let calls = calls.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok::<_, String>(json!({"users": []}))
                    }
                })
                .await
        };

        let (a, b) = tokio::join!(
            fetch(client.clone(), calls.clone()),
            fetch(client.clone(), calls.clone())
        );
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_key_locks_are_released() {
        let client = QueryClient::default();
        client
            .fetch_query(&key("/users"), || async { Ok::<_, String>(1u8) })
            .await
            .unwrap();
        assert!(client.inner.locks().is_empty());
    }

    #[tokio::test]
    async fn test_dropped_waiter_does_not_leak_key_lock() {
        let client = QueryClient::default();
        let held = client.lock_key(&key("/users")).await;

        let users = key("/users");
        let mut waiter = Box::pin(client.fetch_query(&users, || async { Ok::<_, String>(1u8) }));
        assert!(futures::poll!(waiter.as_mut()).is_pending());

        // The holder leaves first, then the waiter is dropped before it
        // ever acquires the key.
        drop(held);
        drop(waiter);

        client
            .fetch_query(&key("/teams"), || async { Ok::<_, String>(2u8) })
            .await
            .unwrap();
        assert!(client.inner.locks().is_empty());
    }

    #[tokio::test]
    async fn test_invalidate_by_prefix() {
        let client = QueryClient::new(QueryClientConfig::new().with_stale_time(Duration::from_secs(60)));
        let root = key("/users/search");
        let john = root.clone().with_body(json!({"name": "John"}));
        let jane = root.clone().with_body(json!({"name": "Jane"}));
        client.set_query_data(&john, 1u32).await;
        client.set_query_data(&jane, 2u32).await;
        client.set_query_data(&key("/users"), 3u32).await;

        assert!(!client.is_stale(&john).await);
        assert_eq!(client.invalidate_queries(&root).await, 2);
        assert!(client.is_stale(&john).await);
        assert!(client.is_stale(&jane).await);
        assert!(!client.is_stale(&key("/users")).await);

        // Invalidated data is still readable.
        assert_eq!(*client.get_query_data::<u32>(&john).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_remove_queries() {
        let client = QueryClient::default();
        client.set_query_data(&key("/a"), 1u8).await;
        client.set_query_data(&key("/a").with_body(json!(1)), 2u8).await;
        client.set_query_data(&key("/b"), 3u8).await;

        assert_eq!(client.remove_queries(&key("/a")).await, 2);
        assert_eq!(client.keys().await, vec![key("/b")]);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let client = QueryClient::default();
        let result: Result<Arc<u8>, String> = client
            .fetch_query(&key("/users"), || async { Err("down".to_string()) })
            .await;
        assert_eq!(result.unwrap_err(), "down");
        assert!(client.keys().await.is_empty());
    }
}
