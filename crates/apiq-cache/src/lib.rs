//! Reactive query cache.
//!
//! This crate provides:
//! - `QueryClient` - Shared keyed store with prefix invalidation and
//!   per-key fetch deduplication
//! - `Query` - Single-key query with observable state
//! - `InfiniteQuery` - Paginated query accumulating pages under one key
//! - `Mutation` - Write operation with success/error/settled callbacks
//! - `RetryPolicy` - Retry strategies for query and mutation functions

mod client;
mod infinite;
mod mutation;
mod query;
mod retry;
mod state;

pub use client::*;
pub use infinite::*;
pub use mutation::*;
pub use query::*;
pub use retry::*;
pub use state::*;
