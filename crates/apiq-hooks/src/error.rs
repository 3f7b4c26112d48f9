//! Binding errors.

use apiq_core::NotFoundError;
use thiserror::Error;

use crate::alias::AliasKind;

/// Errors raised while building an operation.
///
/// Fetch and mutation failures are not reported here; they surface as the
/// error state of the query or mutation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HooksError {
    /// The path or alias is not declared.
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// A synthesized operation was invoked through the wrong builder.
    #[error("Operation '{name}' is a {actual} operation, not a {expected} operation")]
    AliasShape {
        name: String,
        expected: AliasKind,
        actual: AliasKind,
    },

    /// A typed request body could not be serialized.
    #[error("Invalid request body: {0}")]
    InvalidBody(String),
}
