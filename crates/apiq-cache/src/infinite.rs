//! Paginated ("infinite") queries.
//!
//! All pages live under one stable cache key as an [`InfiniteData`]. The
//! first page is fetched without a page parameter; every further page
//! parameter comes from the caller's `get_next_page_param`.

use std::fmt::{self, Debug};
use std::future::Future;
use std::sync::Arc;

use apiq_core::CacheKey;
use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::watch;
use tracing::debug;

use crate::client::QueryClient;
use crate::query::QueryOptions;
use crate::state::QueryStatus;

/// A boxed page function: `None` fetches the first page.
pub type PageFn<T, P, E> = Arc<dyn Fn(Option<P>) -> BoxFuture<'static, Result<T, E>> + Send + Sync>;

/// Decides the next page parameter from the last page and all pages so far.
pub type NextPageParamFn<T, P> = Arc<dyn Fn(&T, &[Arc<T>]) -> Option<P> + Send + Sync>;

/// The pages fetched so far and the parameter each was fetched with.
#[derive(Debug)]
pub struct InfiniteData<T, P> {
    pub pages: Vec<Arc<T>>,
    pub page_params: Vec<Option<P>>,
}

impl<T, P: Clone> Clone for InfiniteData<T, P> {
    fn clone(&self) -> Self {
        Self {
            pages: self.pages.clone(),
            page_params: self.page_params.clone(),
        }
    }
}

impl<T, P> InfiniteData<T, P> {
    fn first(page: T) -> Self {
        Self {
            pages: vec![Arc::new(page)],
            page_params: vec![None],
        }
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Snapshot of an infinite query's state.
pub struct InfiniteQueryState<T, P, E> {
    pub status: QueryStatus,
    pub data: Option<Arc<InfiniteData<T, P>>>,
    pub error: Option<E>,
    pub is_fetching: bool,
    pub is_fetching_next_page: bool,
    pub has_next_page: bool,
    pub failure_count: u32,
}

impl<T, P, E> InfiniteQueryState<T, P, E> {
    fn idle() -> Self {
        Self {
            status: QueryStatus::Idle,
            data: None,
            error: None,
            is_fetching: false,
            is_fetching_next_page: false,
            has_next_page: false,
            failure_count: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }

    /// The fetched pages, oldest first.
    pub fn pages(&self) -> &[Arc<T>] {
        self.data.as_ref().map(|d| d.pages.as_slice()).unwrap_or(&[])
    }
}

impl<T, P, E: Clone> Clone for InfiniteQueryState<T, P, E> {
    fn clone(&self) -> Self {
        Self {
            status: self.status,
            data: self.data.clone(),
            error: self.error.clone(),
            is_fetching: self.is_fetching,
            is_fetching_next_page: self.is_fetching_next_page,
            has_next_page: self.has_next_page,
            failure_count: self.failure_count,
        }
    }
}

impl<T: Debug, P: Debug, E: Debug> Debug for InfiniteQueryState<T, P, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InfiniteQueryState")
            .field("status", &self.status)
            .field("data", &self.data)
            .field("error", &self.error)
            .field("is_fetching_next_page", &self.is_fetching_next_page)
            .field("has_next_page", &self.has_next_page)
            .finish_non_exhaustive()
    }
}

/// A paginated query bound to one stable cache key.
pub struct InfiniteQuery<T, P, E> {
    client: QueryClient,
    key: CacheKey,
    fetch_page: PageFn<T, P, E>,
    next_page_param: NextPageParamFn<T, P>,
    options: QueryOptions,
    state: watch::Sender<InfiniteQueryState<T, P, E>>,
}

impl<T, P, E> InfiniteQuery<T, P, E>
where
    T: Send + Sync + 'static,
    P: Clone + Debug + Send + Sync + 'static,
    E: Clone + Debug + Send + Sync + 'static,
{
    pub fn new<F, Fut, N>(
        client: QueryClient,
        key: CacheKey,
        options: QueryOptions,
        fetch_page: F,
        get_next_page_param: N,
    ) -> Self
    where
        F: Fn(Option<P>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        N: Fn(&T, &[Arc<T>]) -> Option<P> + Send + Sync + 'static,
    {
        let fetch_page: PageFn<T, P, E> = Arc::new(move |param| fetch_page(param).boxed());
        let (state, _) = watch::channel(InfiniteQueryState::idle());
        Self {
            client,
            key,
            fetch_page,
            next_page_param: Arc::new(get_next_page_param),
            options,
            state,
        }
    }

    /// The stable key shared by every page.
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    pub fn client(&self) -> &QueryClient {
        &self.client
    }

    pub fn state(&self) -> InfiniteQueryState<T, P, E> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<InfiniteQueryState<T, P, E>> {
        self.state.subscribe()
    }

    pub fn has_next_page(&self) -> bool {
        self.state.borrow().has_next_page
    }

    pub fn is_fetching_next_page(&self) -> bool {
        self.state.borrow().is_fetching_next_page
    }

    /// Return the cached pages while fresh. Otherwise reload from the first
    /// page, refetching as many pages as were loaded before.
    pub async fn fetch(&self) -> InfiniteQueryState<T, P, E> {
        self.fetch_first(false).await
    }

    /// Reload every loaded page from the first one, ignoring freshness.
    ///
    /// Page parameters are recomputed from the fresh pages, so a shifted
    /// cursor is followed rather than replayed.
    pub async fn refetch(&self) -> InfiniteQueryState<T, P, E> {
        self.fetch_first(true).await
    }

    /// Mark this key and every key below it as stale.
    pub async fn invalidate(&self) -> usize {
        self.client.invalidate_queries(&self.key).await
    }

    /// Fetch the page after the last loaded one and append it.
    ///
    /// Loads the first page instead when nothing is loaded yet. Does nothing
    /// when `get_next_page_param` returns `None`. Calls overlapping on one
    /// key share a single request: a caller that finds a page appended
    /// while it waited returns that instead of fetching again.
    pub async fn fetch_next_page(&self) -> InfiniteQueryState<T, P, E> {
        if !self.options.enabled {
            return self.state();
        }
        let seen = self.state.borrow().data.clone();
        let Some(seen) = seen else {
            return self.fetch().await;
        };

        let _guard = self.client.lock_key(&self.key).await;
        let latest = self.client.get_query_data::<InfiniteData<T, P>>(&self.key).await;
        let current = match latest {
            Some(latest) if latest.len() > seen.len() => {
                debug!(key = %self.key, pages = latest.len(), "Reusing concurrent page fetch");
                let has_next = self.next_param(&latest).is_some();
                self.state.send_modify(|s| {
                    s.status = QueryStatus::Success;
                    s.data = Some(latest);
                    s.error = None;
                    s.failure_count = 0;
                    s.has_next_page = has_next;
                });
                return self.state();
            }
            _ => seen,
        };
        let Some(param) = self.next_param(&current) else {
            debug!(key = %self.key, "No next page");
            self.state.send_modify(|s| s.has_next_page = false);
            return self.state();
        };

        debug!(key = %self.key, page = current.len(), param = ?param, "Fetching next page");
        self.state.send_modify(|s| {
            s.is_fetching = true;
            s.is_fetching_next_page = true;
        });

        let (_, retry) = self.options.resolve(&self.client);
        let fetch_page = self.fetch_page.clone();
        let result = retry.run(|| fetch_page(Some(param.clone()))).await;

        match result {
            Ok(page) => {
                let mut next = InfiniteData::clone(&current);
                next.pages.push(Arc::new(page));
                next.page_params.push(Some(param));
                let stored = self.client.store(&self.key, Arc::new(next)).await;
                let has_next = self.next_param(&stored).is_some();
                self.state.send_modify(|s| {
                    s.status = QueryStatus::Success;
                    s.data = Some(stored);
                    s.error = None;
                    s.failure_count = 0;
                    s.has_next_page = has_next;
                });
            }
            Err((err, failures)) => {
                self.state.send_modify(|s| {
                    s.status = QueryStatus::Error;
                    s.error = Some(err);
                    s.failure_count = failures;
                });
            }
        }
        self.state.send_modify(|s| {
            s.is_fetching = false;
            s.is_fetching_next_page = false;
        });
        self.state()
    }

    async fn fetch_first(&self, force: bool) -> InfiniteQueryState<T, P, E> {
        if !self.options.enabled {
            debug!(key = %self.key, "Infinite query disabled, skipping fetch");
            return self.state();
        }
        self.state.send_modify(|s| {
            s.is_fetching = true;
            if s.data.is_none() {
                s.status = QueryStatus::Loading;
            }
        });

        let loaded = match self.client.get_query_data::<InfiniteData<T, P>>(&self.key).await {
            Some(cached) => cached.len(),
            None => self.state.borrow().data.as_ref().map_or(0, |d| d.len()),
        };
        let (stale_time, retry) = self.options.resolve(&self.client);
        let fetch_page = self.fetch_page.clone();
        let next_page_param = self.next_page_param.clone();
        let result = self
            .client
            .fetch_with(&self.key, stale_time, &retry, force, move || {
                let fetch_page = fetch_page.clone();
                let next_page_param = next_page_param.clone();
                async move {
                    let mut data = InfiniteData::first(fetch_page(None).await?);
                    while data.len() < loaded {
                        let next = data.pages.last().and_then(|last| next_page_param(last, &data.pages));
                        let Some(param) = next else { break };
                        let page = fetch_page(Some(param.clone())).await?;
                        data.pages.push(Arc::new(page));
                        data.page_params.push(Some(param));
                    }
                    Ok::<_, E>(data)
                }
            })
            .await;

        let has_next = match &result {
            Ok(data) => self.next_param(data).is_some(),
            Err(_) => false,
        };
        self.state.send_modify(|s| {
            s.is_fetching = false;
            match result {
                Ok(data) => {
                    s.status = QueryStatus::Success;
                    s.data = Some(data);
                    s.error = None;
                    s.failure_count = 0;
                    s.has_next_page = has_next;
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

    fn next_param(&self, data: &InfiniteData<T, P>) -> Option<P> {
        let last = data.pages.last()?;
        (self.next_page_param)(last, &data.pages)
    }
}
