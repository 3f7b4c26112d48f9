//! The HTTP client seam.

use apiq_core::{Method, RequestConfig};
use async_trait::async_trait;
use serde_json::Value;

use crate::{FetchError, RequestOptions, Response};

/// Something that can perform an HTTP request.
///
/// Query and mutation operations talk to the network only through this
/// trait. Implementations are expected to fail with [`FetchError::Http`] on
/// non-2xx statuses.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Perform a request.
    async fn request(&self, options: RequestOptions) -> Result<Response, FetchError>;

    /// GET `path` with the given configuration.
    async fn get(&self, path: &str, config: &RequestConfig) -> Result<Response, FetchError> {
        self.request(RequestOptions::from_config(Method::Get, path, config))
            .await
    }

    /// POST `body` to `path`.
    async fn post(
        &self,
        path: &str,
        body: Option<Value>,
        config: &RequestConfig,
    ) -> Result<Response, FetchError> {
        self.request(RequestOptions::from_config(Method::Post, path, config).with_body(body))
            .await
    }

    /// PUT `body` to `path`.
    async fn put(
        &self,
        path: &str,
        body: Option<Value>,
        config: &RequestConfig,
    ) -> Result<Response, FetchError> {
        self.request(RequestOptions::from_config(Method::Put, path, config).with_body(body))
            .await
    }

    /// PATCH `path` with `body`.
    async fn patch(
        &self,
        path: &str,
        body: Option<Value>,
        config: &RequestConfig,
    ) -> Result<Response, FetchError> {
        self.request(RequestOptions::from_config(Method::Patch, path, config).with_body(body))
            .await
    }

    /// DELETE `path`, optionally with a body.
    async fn delete(
        &self,
        path: &str,
        body: Option<Value>,
        config: &RequestConfig,
    ) -> Result<Response, FetchError> {
        self.request(RequestOptions::from_config(Method::Delete, path, config).with_body(body))
            .await
    }
}
