//! Cache key derivation.

use apiq_core::{CacheKey, EndpointDescriptor, KeyParams, RequestConfig};
use serde_json::Value;

/// Key for a query or mutation on `endpoint`.
///
/// Without a configuration the key is the endpoint identity alone. With one,
/// a second segment carries its `params` and `queries`; headers and body
/// never take part.
pub fn derive_key(api: &str, endpoint: &EndpointDescriptor, config: Option<&RequestConfig>) -> CacheKey {
    let identity = CacheKey::identity(api, &endpoint.path);
    match config {
        Some(config) => identity.with_params(&KeyParams::from_config(config)),
        None => identity,
    }
}

/// Key a built query or infinite query is cached under.
///
/// Always carries the `{params, queries}` segment, so an absent and an empty
/// configuration share one entry. [`derive_key`] without a configuration is
/// a prefix of it.
pub fn derive_query_key(api: &str, endpoint: &EndpointDescriptor, config: &RequestConfig) -> CacheKey {
    CacheKey::identity(api, &endpoint.path).with_params(&KeyParams::from_config(config))
}

/// Key for an immutable query: identity, the `{params, queries}` segment
/// (always present) and the body when there is one.
pub fn derive_immutable_key(
    api: &str,
    endpoint: &EndpointDescriptor,
    config: Option<&RequestConfig>,
    body: Option<&Value>,
) -> CacheKey {
    let params = config.map(KeyParams::from_config).unwrap_or_default();
    let key = CacheKey::identity(api, &endpoint.path).with_params(&params);
    match body {
        Some(body) => key.with_body(body.clone()),
        None => key,
    }
}
