//! Core abstractions for the apiq binding engine.
//!
//! This crate provides the fundamental types shared by every other crate:
//! - `Method` - HTTP verbs an endpoint can declare
//! - `EndpointDescriptor` - One declared endpoint (method, path, alias, shapes)
//! - `EndpointRegistry` - Read-only, ordered endpoint list with path/alias lookup
//! - `RequestConfig` / `PageFragment` - Per-call runtime configuration
//! - `CacheKey` - Hierarchical, structurally comparable cache identity
//! - `ApiDefinition` - TOML/JSON API definition files

mod config;
mod definition;
mod endpoint;
mod error;
mod key;
mod method;
mod registry;

pub use config::*;
pub use definition::*;
pub use endpoint::*;
pub use error::*;
pub use key::*;
pub use method::*;
pub use registry::*;
