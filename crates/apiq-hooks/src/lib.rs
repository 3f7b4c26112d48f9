//! Binds declared API endpoints to cached data-fetching operations.
//!
//! Given an [`EndpointRegistry`](apiq_core::EndpointRegistry), an
//! [`HttpClient`](apiq_http::HttpClient) and a
//! [`QueryClient`](apiq_cache::QueryClient), [`ApiHooks`] builds:
//! - point queries for `get` endpoints
//! - immutable queries for `post` endpoints whose body is a read parameter
//! - paginated queries that merge a page fragment into the base parameters
//! - mutations for `post`, `put`, `patch` and `delete`
//! - one `create<Alias>` operation per aliased endpoint
//!
//! Each operation carries its cache key and can invalidate everything cached
//! under it.
//!
//! # Example
//!
//! ```rust,ignore
//! use apiq_hooks::prelude::*;
//!
//! let hooks = ApiHooks::new("users", Arc::new(registry), Arc::new(http), QueryClient::default());
//!
//! let user = hooks.create_query::<User>(
//!     "/users/:id",
//!     Some(RequestConfig::new().param("id", 1)),
//!     QueryOptions::new(),
//! )?;
//! let state = user.fetch().await;
//!
//! let create = hooks.alias_mutation::<NewUser, User>("createCreateUser", None, MutationOptions::new())?;
//! create.mutate(NewUser { name: "John".into() }).await?;
//! user.invalidate().await;
//! ```

mod alias;
mod error;
mod hooks;
mod key;
mod operations;
mod pagination;
mod typed;

pub use alias::*;
pub use error::HooksError;
pub use hooks::ApiHooks;
pub use key::*;
pub use operations::*;
pub use pagination::*;
pub use typed::Endpoint;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{
        ApiHooks, ApiInfiniteQuery, ApiMutation, ApiQuery, Endpoint, HooksError, PagingKeys,
    };
    pub use apiq_cache::{MutationOptions, QueryClient, QueryClientConfig, QueryOptions};
    pub use apiq_core::{CacheKey, EndpointDescriptor, EndpointRegistry, Method, PageFragment, RequestConfig};
    pub use apiq_http::{FetchClient, FetchError, HttpClient};
    pub use std::sync::Arc;
}
