//! HTTP response handling.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::FetchError;

/// An HTTP response as seen by the binding engine.
#[derive(Debug, Clone)]
pub struct Response {
    /// The HTTP status code.
    pub status: u16,
    /// The response headers.
    pub headers: HashMap<String, String>,
    /// The response body.
    pub body: Vec<u8>,
}

impl Response {
    /// Create a new response.
    pub fn new(status: u16, headers: HashMap<String, String>, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// A 200 response carrying a JSON document.
    pub fn json_ok(value: &Value) -> Self {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Self::new(200, headers, value.to_string().into_bytes())
    }

    /// Check if the response was successful (2xx status).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if the response is a client error (4xx status).
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    /// Check if the response is a server error (5xx status).
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }

    /// Get the response body as text.
    pub fn text(&self) -> Result<String, FetchError> {
        String::from_utf8(self.body.clone())
            .map_err(|e| FetchError::Validation(format!("Invalid UTF-8: {}", e)))
    }

    /// Decode the body into `T`.
    ///
    /// A body that does not fit `T` is a validation failure; this is where
    /// declared response shapes are enforced.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, FetchError> {
        if self.body.is_empty() {
            return serde_json::from_value(Value::Null)
                .map_err(|e| FetchError::Validation(e.to_string()));
        }
        serde_json::from_slice(&self.body).map_err(|e| FetchError::Validation(e.to_string()))
    }

    /// Get a header value (case-insensitive).
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Get the Content-Type header.
    pub fn content_type(&self) -> Option<&str> {
        self.header("Content-Type")
    }

    /// Convert to a Result, returning an error for non-2xx status codes.
    pub fn error_for_status(self) -> Result<Self, FetchError> {
        if self.is_success() {
            Ok(self)
        } else {
            let message = self.text().unwrap_or_else(|_| "Unknown error".to_string());
            Err(FetchError::Http {
                status: self.status,
                message,
            })
        }
    }
}
