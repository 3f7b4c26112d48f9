//! Declarative API definition files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::endpoint::EndpointDescriptor;
use crate::error::RegistryError;
use crate::registry::EndpointRegistry;

/// Format of an API definition document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionFormat {
    Toml,
    Json,
}

impl DefinitionFormat {
    /// Pick the format from a file name (`.json` is JSON, anything else TOML).
    pub fn from_path(path: &str) -> Self {
        if path.ends_with(".json") {
            Self::Json
        } else {
            Self::Toml
        }
    }
}

/// An API described as data: a name plus its endpoints.
///
/// ```toml
/// name = "users"
/// base_url = "https://api.example.com"
///
/// [[endpoints]]
/// method = "get"
/// path = "/users/:id"
/// alias = "getUser"
///
/// [[endpoints]]
/// method = "post"
/// path = "/users/search"
/// alias = "searchUsers"
/// immutable = true
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiDefinition {
    /// API identifier; becomes the `api` field of every cache key.
    pub name: String,
    /// Base URL requests are resolved against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Headers sent with every request.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Endpoints, in declaration order.
    #[serde(default)]
    pub endpoints: Vec<EndpointDescriptor>,
}

impl ApiDefinition {
    /// Parse a definition document.
    pub fn parse(content: &str, format: DefinitionFormat) -> Result<Self, RegistryError> {
        match format {
            DefinitionFormat::Toml => {
                toml::from_str(content).map_err(|e| RegistryError::Parse(e.to_string()))
            }
            DefinitionFormat::Json => {
                serde_json::from_str(content).map_err(|e| RegistryError::Parse(e.to_string()))
            }
        }
    }

    /// Validate the endpoints and build a registry.
    pub fn registry(&self) -> Result<EndpointRegistry, RegistryError> {
        EndpointRegistry::new(self.endpoints.clone())
    }
}
