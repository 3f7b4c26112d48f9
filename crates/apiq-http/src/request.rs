//! Request options handed to an [`HttpClient`](crate::HttpClient).

use apiq_core::{Headers, Method, ParamMap, RequestConfig};
use serde_json::Value;

use crate::FetchError;

/// Everything needed to issue one request.
///
/// The binding engine only builds these; it never interprets the response
/// beyond decoding the body.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOptions {
    /// HTTP method.
    pub method: Method,
    /// Path template (e.g., "/users/:id").
    pub path: String,
    /// Values for the `:name` segments.
    pub params: Option<ParamMap>,
    /// Query string parameters.
    pub queries: Option<ParamMap>,
    /// Extra request headers.
    pub headers: Headers,
    /// JSON request body.
    pub body: Option<Value>,
}

impl RequestOptions {
    /// Create options with no parameters.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: None,
            queries: None,
            headers: Headers::new(),
            body: None,
        }
    }

    /// Create options from a call-site configuration, including its body.
    pub fn from_config(method: Method, path: impl Into<String>, config: &RequestConfig) -> Self {
        Self {
            method,
            path: path.into(),
            params: config.params.clone(),
            queries: config.queries.clone(),
            headers: config.headers.clone(),
            body: config.body.clone(),
        }
    }

    /// Replace the body.
    pub fn with_body(mut self, body: Option<Value>) -> Self {
        self.body = body;
        self
    }

    /// Add a header.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Path segments with every `:name` replaced by its parameter value.
    pub fn path_segments(&self) -> Result<Vec<String>, FetchError> {
        self.path
            .trim_start_matches('/')
            .split('/')
            .map(|segment| match segment.strip_prefix(':') {
                Some(name) => self
                    .params
                    .as_ref()
                    .and_then(|params| params.get(name))
                    .and_then(scalar_to_string)
                    .ok_or_else(|| FetchError::MissingPathParam(name.to_string())),
                None => Ok(segment.to_string()),
            })
            .collect()
    }

    /// The path template with parameters substituted (not percent-encoded).
    pub fn render_path(&self) -> Result<String, FetchError> {
        Ok(format!("/{}", self.path_segments()?.join("/")))
    }

    /// Query string pairs: arrays repeat the key, nulls are skipped.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(queries) = &self.queries {
            for (key, value) in queries {
                match value {
                    Value::Array(items) => {
                        for item in items {
                            if let Some(s) = scalar_to_string(item) {
                                pairs.push((key.clone(), s));
                            }
                        }
                    }
                    other => {
                        if let Some(s) = scalar_to_string(other) {
                            pairs.push((key.clone(), s));
                        }
                    }
                }
            }
        }
        pairs
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
