//! Per-call runtime configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Named parameter values (path params or query params).
///
/// Backed by an ordered map so that structurally equal configurations
/// always serialize identically.
pub type ParamMap = serde_json::Map<String, Value>;

/// HTTP headers supplied at the call site.
pub type Headers = BTreeMap<String, String>;

/// Runtime configuration supplied with one operation invocation.
///
/// Only `params` and `queries` take part in cache identity; headers and body
/// are passed through to the HTTP client unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestConfig {
    /// Path parameters (`:name` segments).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<ParamMap>,
    /// Query string parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queries: Option<ParamMap>,
    /// Extra request headers.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: Headers,
    /// Static request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl RequestConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one path parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params
            .get_or_insert_with(ParamMap::new)
            .insert(name.into(), value.into());
        self
    }

    /// Replace all path parameters.
    pub fn with_params(mut self, params: ParamMap) -> Self {
        self.params = Some(params);
        self
    }

    /// Set one query parameter.
    pub fn query(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.queries
            .get_or_insert_with(ParamMap::new)
            .insert(name.into(), value.into());
        self
    }

    /// Replace all query parameters.
    pub fn with_queries(mut self, queries: ParamMap) -> Self {
        self.queries = Some(queries);
        self
    }

    /// Add a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the static body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// The configuration delta applied to fetch the next page.
///
/// Produced by the caller's `get_next_page_param` and consumed once per
/// page fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageFragment {
    /// Path parameters overriding the base ones.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<ParamMap>,
    /// Query parameters overriding the base ones.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queries: Option<ParamMap>,
    /// Body fields overriding the base body (immutable queries only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl PageFragment {
    /// Create an empty fragment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override one path parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params
            .get_or_insert_with(ParamMap::new)
            .insert(name.into(), value.into());
        self
    }

    /// Override one query parameter.
    pub fn query(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.queries
            .get_or_insert_with(ParamMap::new)
            .insert(name.into(), value.into());
        self
    }

    /// Override one body field.
    ///
    /// Replaces a non-object body with a fresh object.
    pub fn body_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        if !matches!(self.body, Some(Value::Object(_))) {
            self.body = Some(Value::Object(ParamMap::new()));
        }
        if let Some(Value::Object(body)) = self.body.as_mut() {
            body.insert(name.into(), value.into());
        }
        self
    }
}
