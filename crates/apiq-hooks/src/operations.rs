//! Operations handed back by [`ApiHooks`](crate::ApiHooks).
//!
//! Each wraps the cache primitive it was built on (and derefs to it), adding
//! the endpoint it targets. Mutations also carry the endpoint's identity key
//! so callers can invalidate every cached read of that endpoint.

use std::fmt;
use std::ops::Deref;

use apiq_cache::{InfiniteQuery, Mutation, Query};
use apiq_core::{CacheKey, EndpointDescriptor, PageFragment};
use apiq_http::FetchError;

/// A point query (read or immutable POST).
pub struct ApiQuery<T> {
    endpoint: EndpointDescriptor,
    query: Query<T, FetchError>,
}

impl<T> ApiQuery<T> {
    pub(crate) fn new(endpoint: EndpointDescriptor, query: Query<T, FetchError>) -> Self {
        Self { endpoint, query }
    }

    pub fn endpoint(&self) -> &EndpointDescriptor {
        &self.endpoint
    }

    pub fn into_inner(self) -> Query<T, FetchError> {
        self.query
    }
}

impl<T> fmt::Debug for ApiQuery<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiQuery")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl<T> Deref for ApiQuery<T> {
    type Target = Query<T, FetchError>;

    fn deref(&self) -> &Self::Target {
        &self.query
    }
}

/// A paginated query; page parameters are [`PageFragment`]s.
pub struct ApiInfiniteQuery<T> {
    endpoint: EndpointDescriptor,
    query: InfiniteQuery<T, PageFragment, FetchError>,
}

impl<T> ApiInfiniteQuery<T> {
    pub(crate) fn new(
        endpoint: EndpointDescriptor,
        query: InfiniteQuery<T, PageFragment, FetchError>,
    ) -> Self {
        Self { endpoint, query }
    }

    pub fn endpoint(&self) -> &EndpointDescriptor {
        &self.endpoint
    }

    pub fn into_inner(self) -> InfiniteQuery<T, PageFragment, FetchError> {
        self.query
    }
}

impl<T> Deref for ApiInfiniteQuery<T> {
    type Target = InfiniteQuery<T, PageFragment, FetchError>;

    fn deref(&self) -> &Self::Target {
        &self.query
    }
}

/// A write operation.
pub struct ApiMutation<V, T> {
    endpoint: EndpointDescriptor,
    key: CacheKey,
    mutation: Mutation<V, T, FetchError>,
}

impl<V, T> ApiMutation<V, T> {
    pub(crate) fn new(
        endpoint: EndpointDescriptor,
        key: CacheKey,
        mutation: Mutation<V, T, FetchError>,
    ) -> Self {
        Self {
            endpoint,
            key,
            mutation,
        }
    }

    pub fn endpoint(&self) -> &EndpointDescriptor {
        &self.endpoint
    }

    /// The endpoint's identity key.
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Invalidate every cached result of this endpoint.
    pub async fn invalidate(&self) -> usize {
        self.mutation.client().invalidate_queries(&self.key).await
    }

    pub fn into_inner(self) -> Mutation<V, T, FetchError> {
        self.mutation
    }
}

impl<V, T> fmt::Debug for ApiMutation<V, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiMutation")
            .field("endpoint", &self.endpoint)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl<V, T> Deref for ApiMutation<V, T> {
    type Target = Mutation<V, T, FetchError>;

    fn deref(&self) -> &Self::Target {
        &self.mutation
    }
}
