//! Page fragment merging for paginated queries.
//!
//! A paginated query keeps one base configuration. Each page after the first
//! is fetched with the caller's [`PageFragment`] merged over that base, field
//! by field, with the fragment winning. The cache key is derived from the
//! base with every paging key removed, so it stays the same across pages.

use std::fmt;
use std::sync::Arc;

use apiq_core::{KeyParams, PageFragment, ParamMap, RequestConfig};
use serde_json::Value;
use tracing::debug;

/// Names of the fields that change from page to page.
///
/// Backed by a callback that is asked again every time the stable key is
/// derived.
#[derive(Clone)]
pub struct PagingKeys(Arc<dyn Fn() -> Vec<String> + Send + Sync>);

impl PagingKeys {
    /// No paging keys: nothing is stripped from the key.
    pub fn none() -> Self {
        Self::from_fn(Vec::new)
    }

    /// A fixed list.
    pub fn fixed<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        Self::from_fn(move || keys.clone())
    }

    pub fn from_fn(f: impl Fn() -> Vec<String> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Evaluate the callback.
    pub fn resolve(&self) -> Vec<String> {
        (self.0)()
    }
}

impl Default for PagingKeys {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Debug for PagingKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PagingKeys").field(&self.resolve()).finish()
    }
}

/// Shallow merge of two parameter maps; `fragment` wins per field.
///
/// `None` only when both sides are absent.
pub fn merge_maps(base: Option<&ParamMap>, fragment: Option<&ParamMap>) -> Option<ParamMap> {
    match (base, fragment) {
        (None, None) => None,
        (base, fragment) => {
            let mut merged = base.cloned().unwrap_or_default();
            if let Some(fragment) = fragment {
                for (k, v) in fragment {
                    merged.insert(k.clone(), v.clone());
                }
            }
            Some(merged)
        }
    }
}

/// Merge a fragment body over a base body.
///
/// Two objects merge shallowly with the fragment winning; otherwise a
/// present fragment replaces the base.
pub fn merge_body(base: Option<&Value>, fragment: Option<&Value>) -> Option<Value> {
    match (base, fragment) {
        (Some(Value::Object(base)), Some(Value::Object(fragment))) => {
            merge_maps(Some(base), Some(fragment)).map(Value::Object)
        }
        (_, Some(fragment)) => Some(fragment.clone()),
        (base, None) => base.cloned(),
    }
}

/// Merges page fragments into a base configuration.
#[derive(Debug, Clone)]
pub struct PageMerger {
    base: RequestConfig,
    paging_keys: PagingKeys,
    merge_body: bool,
}

impl PageMerger {
    /// Merger for paginated reads: params and queries only.
    pub fn new(base: RequestConfig, paging_keys: PagingKeys) -> Self {
        Self {
            base,
            paging_keys,
            merge_body: false,
        }
    }

    /// Merger for paginated immutable queries: the body merges too.
    pub fn with_body(base: RequestConfig, paging_keys: PagingKeys) -> Self {
        Self {
            base,
            paging_keys,
            merge_body: true,
        }
    }

    pub fn base(&self) -> &RequestConfig {
        &self.base
    }

    /// The configuration for one page. `None` is the first page: the base
    /// configuration unchanged.
    pub fn merge(&self, fragment: Option<&PageFragment>) -> RequestConfig {
        let Some(fragment) = fragment else {
            return self.base.clone();
        };
        debug!(fragment = ?fragment, "Merging page fragment");
        let mut merged = self.base.clone();
        merged.params = merge_maps(self.base.params.as_ref(), fragment.params.as_ref());
        merged.queries = merge_maps(self.base.queries.as_ref(), fragment.queries.as_ref());
        if self.merge_body {
            merged.body = merge_body(self.base.body.as_ref(), fragment.body.as_ref());
        }
        merged
    }

    /// The `{params, queries}` key segment without paging keys.
    pub fn key_params(&self) -> KeyParams {
        KeyParams::from_config(&self.base).without(&self.paging_keys.resolve())
    }

    /// The base body without paging keys, for the key's body segment.
    pub fn key_body(&self) -> Option<Value> {
        match &self.base.body {
            Some(Value::Object(body)) => {
                let mut body = body.clone();
                for key in self.paging_keys.resolve() {
                    body.remove(&key);
                }
                Some(Value::Object(body))
            }
            other => other.clone(),
        }
    }
}
