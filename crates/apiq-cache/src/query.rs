//! Single-key queries.

use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use apiq_core::CacheKey;
use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::watch;
use tracing::debug;

use crate::client::QueryClient;
use crate::retry::RetryPolicy;
use crate::state::{QueryState, QueryStatus};

/// A boxed query function.
pub type QueryFn<T, E> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, E>> + Send + Sync>;

/// Per-query overrides of the client defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    /// Disabled queries never fetch.
    pub enabled: bool,
    /// Overrides [`QueryClientConfig::stale_time`](crate::QueryClientConfig).
    pub stale_time: Option<Duration>,
    /// Overrides the client's retry policy.
    pub retry: Option<RetryPolicy>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            stale_time: None,
            retry: None,
        }
    }
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = Some(stale_time);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    pub(crate) fn resolve(&self, client: &QueryClient) -> (Duration, RetryPolicy) {
        (
            self.stale_time.unwrap_or(client.config().stale_time),
            self.retry.clone().unwrap_or_else(|| client.config().retry.clone()),
        )
    }
}

/// A query bound to one cache key.
///
/// State is published through a `watch` channel; [`Query::subscribe`] hands
/// out receivers that see every transition.
pub struct Query<T, E> {
    client: QueryClient,
    key: CacheKey,
    fetcher: QueryFn<T, E>,
    options: QueryOptions,
    state: watch::Sender<QueryState<T, E>>,
}

impl<T, E> Query<T, E>
where
    T: Send + Sync + 'static,
    E: Clone + Debug + Send + Sync + 'static,
{
    /// Bind `fetcher` to `key` in `client`. Nothing is fetched until
    /// [`Query::fetch`] is called.
    pub fn new<F, Fut>(client: QueryClient, key: CacheKey, options: QueryOptions, fetcher: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let fetcher: QueryFn<T, E> = Arc::new(move || fetcher().boxed());
        let (state, _) = watch::channel(QueryState::idle(None));
        Self {
            client,
            key,
            fetcher,
            options,
            state,
        }
    }

    /// The cache key this query reads and writes.
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    pub fn client(&self) -> &QueryClient {
        &self.client
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// Current state snapshot.
    pub fn state(&self) -> QueryState<T, E> {
        self.state.borrow().clone()
    }

    /// Current data, if any.
    pub fn data(&self) -> Option<Arc<T>> {
        self.state.borrow().data.clone()
    }

    /// Receive every state transition.
    pub fn subscribe(&self) -> watch::Receiver<QueryState<T, E>> {
        self.state.subscribe()
    }

    /// Return fresh cached data or run the query function.
    pub async fn fetch(&self) -> QueryState<T, E> {
        self.run(false).await
    }

    /// Run the query function even if cached data is fresh.
    pub async fn refetch(&self) -> QueryState<T, E> {
        self.run(true).await
    }

    /// Whether the next [`Query::fetch`] would go to the network.
    pub async fn is_stale(&self) -> bool {
        self.client.is_stale(&self.key).await
    }

    /// Mark this key and every key below it as stale.
    pub async fn invalidate(&self) -> usize {
        self.client.invalidate_queries(&self.key).await
    }

    async fn run(&self, force: bool) -> QueryState<T, E> {
        if !self.options.enabled {
            debug!(key = %self.key, "Query disabled, skipping fetch");
            return self.state();
        }

        self.state.send_modify(|s| {
            s.is_fetching = true;
            if s.data.is_none() {
                s.status = QueryStatus::Loading;
            }
        });

        let (stale_time, retry) = self.options.resolve(&self.client);
        let fetcher = self.fetcher.clone();
        let result = self
            .client
            .fetch_with(&self.key, stale_time, &retry, force, move || fetcher())
            .await;

        self.state.send_modify(|s| {
            s.is_fetching = false;
            match result {
                Ok(data) => {
                    s.status = QueryStatus::Success;
                    s.data = Some(data);
                    s.error = None;
                    s.failure_count = 0;
                }
                Err((err, failures)) => {
                    s.status = QueryStatus::Error;
                    s.error = Some(err);
                    s.failure_count = failures;
                }
            }
        });
        self.state()
    }
}
