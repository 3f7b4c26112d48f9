//! HTTP plumbing for apiq.
//!
//! Provides the [`HttpClient`] seam the binding engine fetches through, plus
//! [`FetchClient`], a reqwest-backed implementation with base URL and default
//! header support.
//!
//! # Example
//!
//! ```rust,ignore
//! use apiq_core::RequestConfig;
//! use apiq_http::{FetchClient, HttpClient};
//!
//! let client = FetchClient::new()
//!     .with_base_url("https://api.example.com")
//!     .with_default_header("Accept", "application/json");
//!
//! let user: User = client
//!     .get("/users/:id", &RequestConfig::new().param("id", 7))
//!     .await?
//!     .json()?;
//! ```

mod client;
mod error;
mod request;
mod response;

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

pub use client::HttpClient;
pub use error::FetchError;
pub use request::RequestOptions;
pub use response::Response;

/// HTTP client for making outbound requests with reqwest.
#[derive(Debug, Clone)]
pub struct FetchClient {
    client: reqwest::Client,
    base_url: Option<String>,
    default_headers: HashMap<String, String>,
}

impl Default for FetchClient {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchClient {
    /// Create a new HTTP client.
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    /// Wrap an already configured reqwest client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: None,
            default_headers: HashMap::new(),
        }
    }

    /// Resolve relative request paths against this base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Add a default header that will be included in all requests.
    pub fn with_default_header(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.default_headers.insert(key.into(), value.into());
        self
    }

    /// The configured base URL, if any.
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Build the full URL for a request: base URL, substituted path, query string.
    pub fn build_url(&self, options: &RequestOptions) -> Result<Url, FetchError> {
        let mut url = if options.path.starts_with("http://") || options.path.starts_with("https://")
        {
            Url::parse(&options.path).map_err(|e| FetchError::InvalidUrl(e.to_string()))?
        } else {
            let base = self.base_url.as_deref().ok_or_else(|| {
                FetchError::InvalidUrl(format!("no base URL for relative path '{}'", options.path))
            })?;
            let mut url = Url::parse(base).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
            let segments = options.path_segments()?;
            url.path_segments_mut()
                .map_err(|_| FetchError::InvalidUrl(format!("'{}' cannot be a base", base)))?
                .pop_if_empty()
                .extend(segments.iter().filter(|s| !s.is_empty()));
            url
        };

        let pairs = options.query_pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }
}

#[async_trait]
impl HttpClient for FetchClient {
    async fn request(&self, options: RequestOptions) -> Result<Response, FetchError> {
        let url = self.build_url(&options)?;
        debug!(method = %options.method, url = %url, "Sending request");

        let mut builder = self.client.request(options.method.into(), url);
        for (key, value) in &self.default_headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        for (key, value) in &options.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if let Some(body) = &options.body {
            builder = builder.json(body);
        }

        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let headers = resp
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();
        let body = resp.bytes().await?.to_vec();

        debug!(status, bytes = body.len(), "Received response");
        Response::new(status, headers, body).error_for_status()
    }
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{FetchClient, FetchError, HttpClient, RequestOptions, Response};
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiq_core::{Method, RequestConfig};

    #[test]
    fn test_build_url_with_base() {
        let client = FetchClient::new().with_base_url("http://localhost:8080/api/");
        let config = RequestConfig::new().param("id", 7).query("page", 2);
        let options = RequestOptions::from_config(Method::Get, "/users/:id", &config);
        assert_eq!(
            client.build_url(&options).unwrap().as_str(),
            "http://localhost:8080/api/users/7?page=2"
        );
    }

    #[test]
    fn test_build_url_encodes_segments() {
        let client = FetchClient::new().with_base_url("http://localhost");
        let config = RequestConfig::new().param("name", "a b/c");
        let options = RequestOptions::from_config(Method::Get, "/files/:name", &config);
        assert_eq!(
            client.build_url(&options).unwrap().as_str(),
            "http://localhost/files/a%20b%2Fc"
        );
    }

    #[test]
    fn test_build_url_absolute_path() {
        let client = FetchClient::new().with_base_url("http://ignored");
        let options = RequestOptions::new(Method::Get, "https://other.example.com/x");
        assert_eq!(
            client.build_url(&options).unwrap().as_str(),
            "https://other.example.com/x"
        );
    }

    #[test]
    fn test_build_url_requires_base() {
        let client = FetchClient::new();
        let options = RequestOptions::new(Method::Get, "/users");
        assert!(matches!(
            client.build_url(&options),
            Err(FetchError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_build_url_missing_param() {
        let client = FetchClient::new().with_base_url("http://localhost");
        let options = RequestOptions::new(Method::Get, "/users/:id");
        assert_eq!(
            client.build_url(&options).unwrap_err(),
            FetchError::MissingPathParam("id".to_string())
        );
    }
}
