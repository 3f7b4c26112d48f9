//! Lookup and registry errors.

use thiserror::Error;

use crate::method::Method;

/// A path or alias lookup found no endpoint.
///
/// Always a programming or configuration error, never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotFoundError {
    /// No endpoint declares this method and path template.
    #[error("No endpoint found for path '{method} {path}'")]
    Path { method: Method, path: String },

    /// No endpoint declares this alias.
    #[error("No endpoint found for alias '{0}'")]
    Alias(String),
}

/// An endpoint list was rejected while building a registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Path template is empty or does not start with `/`.
    #[error("Invalid path template '{0}': must start with '/'")]
    InvalidPath(String),

    /// `immutable` was set on a method other than POST.
    #[error("Endpoint '{method} {path}' is flagged immutable but only post endpoints can be")]
    ImmutableNotPost { method: Method, path: String },

    /// The same method and path template were declared twice.
    #[error("Duplicate endpoint '{method} {path}'")]
    Duplicate { method: Method, path: String },

    /// An API definition file could not be parsed.
    #[error("Failed to parse API definition: {0}")]
    Parse(String),
}

/// A string did not name a supported HTTP method.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unsupported method '{0}'")]
pub struct ParseMethodError(pub String);
