//! Ordered, read-only endpoint registry.

use std::collections::{HashMap, HashSet};

use crate::endpoint::EndpointDescriptor;
use crate::error::{NotFoundError, RegistryError};
use crate::method::Method;

/// Ordered list of endpoint descriptors with lookup by path and alias.
///
/// Validation happens once in [`EndpointRegistry::new`]; afterwards the
/// registry is never mutated.
#[derive(Debug, Clone)]
pub struct EndpointRegistry {
    endpoints: Vec<EndpointDescriptor>,
    by_path: HashMap<(Method, String), usize>,
    by_alias: HashMap<String, usize>,
}

impl EndpointRegistry {
    /// Build a registry, validating every descriptor.
    ///
    /// When two endpoints share an alias the later one wins.
    pub fn new(endpoints: Vec<EndpointDescriptor>) -> Result<Self, RegistryError> {
        let mut by_path = HashMap::with_capacity(endpoints.len());
        let mut by_alias = HashMap::new();
        let mut seen_aliases = HashSet::new();

        for (index, endpoint) in endpoints.iter().enumerate() {
            if !endpoint.path.starts_with('/') {
                return Err(RegistryError::InvalidPath(endpoint.path.clone()));
            }
            if endpoint.immutable && endpoint.method != Method::Post {
                return Err(RegistryError::ImmutableNotPost {
                    method: endpoint.method,
                    path: endpoint.path.clone(),
                });
            }
            if by_path
                .insert((endpoint.method, endpoint.path.clone()), index)
                .is_some()
            {
                return Err(RegistryError::Duplicate {
                    method: endpoint.method,
                    path: endpoint.path.clone(),
                });
            }
            if let Some(alias) = endpoint.alias() {
                if !seen_aliases.insert(alias.to_string()) {
                    tracing::warn!(
                        alias,
                        method = %endpoint.method,
                        path = %endpoint.path,
                        "alias declared more than once; the later endpoint wins"
                    );
                }
                by_alias.insert(alias.to_string(), index);
            }
        }

        Ok(Self {
            endpoints,
            by_path,
            by_alias,
        })
    }

    /// Find the endpoint declaring exactly this method and path template.
    pub fn by_path(&self, method: Method, path: &str) -> Result<&EndpointDescriptor, NotFoundError> {
        self.by_path
            .get(&(method, path.to_string()))
            .map(|&index| &self.endpoints[index])
            .ok_or_else(|| NotFoundError::Path {
                method,
                path: path.to_string(),
            })
    }

    /// Find the endpoint declaring this alias.
    pub fn by_alias(&self, alias: &str) -> Result<&EndpointDescriptor, NotFoundError> {
        self.by_alias
            .get(alias)
            .map(|&index| &self.endpoints[index])
            .ok_or_else(|| NotFoundError::Alias(alias.to_string()))
    }

    /// Iterate endpoints in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &EndpointDescriptor> {
        self.endpoints.iter()
    }

    /// Number of endpoints.
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

impl<'a> IntoIterator for &'a EndpointRegistry {
    type Item = &'a EndpointDescriptor;
    type IntoIter = std::slice::Iter<'a, EndpointDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.endpoints.iter()
    }
}
