//! Hierarchical cache keys.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{ParamMap, RequestConfig};

/// The stable identity of an endpoint inside one API binding.
///
/// Always the first segment of a [`CacheKey`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndpointIdentity {
    /// API identifier the binding was constructed with.
    pub api: String,
    /// Path template of the endpoint.
    pub path: String,
}

impl EndpointIdentity {
    /// Create an identity.
    pub fn new(api: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            api: api.into(),
            path: path.into(),
        }
    }
}

/// The identity-relevant subset of a [`RequestConfig`]: params and queries.
///
/// Absent fields stay absent; nothing else from the configuration is copied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<ParamMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queries: Option<ParamMap>,
}

impl KeyParams {
    /// Pick `params` and `queries` out of a configuration.
    pub fn from_config(config: &RequestConfig) -> Self {
        Self {
            params: config.params.clone(),
            queries: config.queries.clone(),
        }
    }

    /// Drop the named fields from both params and queries.
    pub fn without(mut self, keys: &[String]) -> Self {
        for map in [self.params.as_mut(), self.queries.as_mut()].into_iter().flatten() {
            for key in keys {
                map.remove(key);
            }
        }
        self
    }

    fn to_value(&self) -> Value {
        let mut segment = ParamMap::new();
        if let Some(params) = &self.params {
            segment.insert("params".to_string(), Value::Object(params.clone()));
        }
        if let Some(queries) = &self.queries {
            segment.insert("queries".to_string(), Value::Object(queries.clone()));
        }
        Value::Object(segment)
    }
}

/// A cache key uniquely identifying a cached result set.
///
/// An ordered sequence of JSON segments:
/// 1. `{api, path}`: the endpoint identity
/// 2. `{params?, queries?}`: present when a configuration was supplied
/// 3. the request body: immutable queries only
///
/// Keys compare structurally, segment by segment. An identity-only key is a
/// prefix of every parameterized key of the same endpoint, which is what
/// prefix invalidation relies on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(Vec<Value>);

// serde_json numbers are never NaN, so structural equality is total.
impl Eq for CacheKey {}

impl Hash for CacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical().hash(state);
    }
}

impl CacheKey {
    /// One-segment key identifying an endpoint.
    pub fn identity(api: impl Into<String>, path: impl Into<String>) -> Self {
        Self::from_identity(&EndpointIdentity::new(api, path))
    }

    /// One-segment key from an existing identity.
    pub fn from_identity(identity: &EndpointIdentity) -> Self {
        let mut segment = ParamMap::new();
        segment.insert("api".to_string(), Value::String(identity.api.clone()));
        segment.insert("path".to_string(), Value::String(identity.path.clone()));
        Self(vec![Value::Object(segment)])
    }

    /// Append the `{params, queries}` segment.
    pub fn with_params(mut self, params: &KeyParams) -> Self {
        self.0.push(params.to_value());
        self
    }

    /// Append a body segment.
    pub fn with_body(mut self, body: Value) -> Self {
        self.0.push(body);
        self
    }

    /// The raw segments.
    pub fn segments(&self) -> &[Value] {
        &self.0
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the key has no segments.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The identity-only key this key descends from.
    pub fn root(&self) -> CacheKey {
        Self(self.0.iter().take(1).cloned().collect())
    }

    /// Whether `prefix` matches the leading segments of this key.
    pub fn starts_with(&self, prefix: &CacheKey) -> bool {
        prefix.0.len() <= self.0.len() && self.0.iter().zip(&prefix.0).all(|(a, b)| a == b)
    }

    /// Canonical string form: compact JSON with object keys sorted.
    ///
    /// Equal keys always produce equal strings.
    pub fn canonical(&self) -> String {
        let mut out = String::new();
        write_canonical(&Value::Array(self.0.clone()), &mut out);
        out
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (k, v)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(k.clone()).to_string());
                out.push(':');
                write_canonical(v, out);
            }
            out.push('}');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn test_identity_key_shape() {
        let key = CacheKey::identity("test", "/users/:id");
        assert_eq!(
            serde_json::to_value(&key).unwrap(),
            json!([{"api": "test", "path": "/users/:id"}])
        );
    }

    #[test]
    fn test_params_segment_omits_absent_fields() {
        let config = RequestConfig::new().param("id", 1).header("X-Trace", "1");
        let key = CacheKey::identity("test", "/users/:id")
            .with_params(&KeyParams::from_config(&config));
        assert_eq!(
            serde_json::to_value(&key).unwrap(),
            json!([{"api": "test", "path": "/users/:id"}, {"params": {"id": 1}}])
        );
    }

    #[test]
    fn test_empty_config_yields_empty_segment() {
        let key = CacheKey::identity("test", "/users")
            .with_params(&KeyParams::from_config(&RequestConfig::new()));
        assert_eq!(key.len(), 2);
        assert_eq!(key.segments()[1], json!({}));
    }

    #[test]
    fn test_prefix_matching() {
        let root = CacheKey::identity("test", "/users");
        let full = root
            .clone()
            .with_params(&KeyParams::from_config(&RequestConfig::new().query("page", 1)));
        assert!(full.starts_with(&root));
        assert!(full.starts_with(&full));
        assert!(!root.starts_with(&full));
        assert!(!full.starts_with(&CacheKey::identity("test", "/other")));
        assert_eq!(full.root(), root);
    }

    #[test]
    fn test_without_drops_named_fields() {
        let config = RequestConfig::new()
            .param("id", 1)
            .query("page", 2)
            .query("limit", 10);
        let params = KeyParams::from_config(&config).without(&["page".to_string()]);
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({"params": {"id": 1}, "queries": {"limit": 10}})
        );
    }

    #[test]
    fn test_equal_keys_hash_equal() {
        let a = CacheKey::identity("test", "/users")
            .with_body(json!({"name": "John", "page": 1}));
        let b = CacheKey::identity("test", "/users")
            .with_body(json!({"page": 1, "name": "John"}));
        assert_eq!(a, b);
        assert_eq!(a.canonical(), b.canonical());

        let mut set = HashSet::new();
        set.insert(a);
        set.insert(b);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_different_bodies_differ() {
        let root = CacheKey::identity("test", "/users/search");
        let john = root.clone().with_body(json!({"name": "John"}));
        let jane = root.clone().with_body(json!({"name": "Jane"}));
        assert_ne!(john, jane);
        assert!(john.starts_with(&root));
        assert!(jane.starts_with(&root));
    }

    #[test]
    fn test_canonical_form() {
        let key = CacheKey::identity("test", "/users").with_body(json!({"b": [1, "x"], "a": null}));
        assert_eq!(
            key.canonical(),
            r#"[{"api":"test","path":"/users"},{"a":null,"b":[1,"x"]}]"#
        );
        assert_eq!(key.to_string(), key.canonical());
    }
}
