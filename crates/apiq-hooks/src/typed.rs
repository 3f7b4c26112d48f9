//! Endpoints described as types.

use apiq_core::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// An endpoint known at compile time.
///
/// Binds the request body and response types to the method and path, so
/// operations built from it are typed end to end.
///
/// ```rust,ignore
/// struct GetUser;
///
/// impl Endpoint for GetUser {
///     const METHOD: Method = Method::Get;
///     const PATH: &'static str = "/users/:id";
///     type Body = ();
///     type Response = User;
/// }
///
/// let query = hooks.endpoint_query::<GetUser>(Some(config), QueryOptions::new())?;
/// ```
pub trait Endpoint {
    const METHOD: Method;
    const PATH: &'static str;

    /// Request body (`()` for none).
    type Body: Serialize + Clone + Send + Sync + 'static;

    /// Decoded response.
    type Response: DeserializeOwned + Send + Sync + 'static;
}
