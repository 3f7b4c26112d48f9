//! Named operations synthesized from endpoint aliases.
//!
//! Every aliased endpoint gets one operation named `create<Alias>` with the
//! first letter of the alias upper-cased (`getUser` becomes `createGetUser`).
//! The builder shape follows the endpoint:
//!
//! | endpoint | shape |
//! |---|---|
//! | `get` | [`AliasKind::Query`] (paginated through the infinite entry point) |
//! | `post` flagged immutable | [`AliasKind::ImmutableQuery`] |
//! | any other `post`, `put`, `patch`, `delete` | [`AliasKind::Mutation`] |

use std::collections::BTreeMap;
use std::fmt;

use apiq_core::{EndpointDescriptor, EndpointRegistry, Method};
use tracing::{debug, warn};

/// Builder shape of a synthesized operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AliasKind {
    Query,
    ImmutableQuery,
    Mutation,
}

impl AliasKind {
    /// Shape for an endpoint.
    pub fn of(endpoint: &EndpointDescriptor) -> Self {
        if !endpoint.method.is_mutating() {
            Self::Query
        } else if endpoint.is_immutable_query() {
            Self::ImmutableQuery
        } else {
            Self::Mutation
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::ImmutableQuery => "immutable query",
            Self::Mutation => "mutation",
        }
    }
}

impl fmt::Display for AliasKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One synthesized operation.
#[derive(Debug, Clone, PartialEq)]
pub struct AliasOperation {
    /// Synthesized name, e.g. `createGetUser`.
    pub name: String,
    /// The alias it was synthesized from.
    pub alias: String,
    pub kind: AliasKind,
    /// The resolved endpoint.
    pub endpoint: EndpointDescriptor,
}

impl AliasOperation {
    pub fn method(&self) -> Method {
        self.endpoint.method
    }

    pub fn path(&self) -> &str {
        &self.endpoint.path
    }
}

/// Upper-case the first character.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// The synthesized operation name for an alias.
pub fn operation_name(alias: &str) -> String {
    format!("create{}", capitalize(alias))
}

/// Immutable lookup table from synthesized name to operation.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    operations: BTreeMap<String, AliasOperation>,
}

impl AliasTable {
    /// Synthesize one operation per aliased endpoint.
    ///
    /// When two endpoints synthesize the same name, the one registered last
    /// wins.
    pub fn build(registry: &EndpointRegistry) -> Self {
        let mut operations = BTreeMap::new();
        for endpoint in registry {
            let Some(alias) = endpoint.alias() else {
                continue;
            };
            let name = operation_name(alias);
            let op = AliasOperation {
                name: name.clone(),
                alias: alias.to_string(),
                kind: AliasKind::of(endpoint),
                endpoint: endpoint.clone(),
            };
            debug!(name = %name, kind = %op.kind, method = %endpoint.method, path = %endpoint.path, "Synthesized operation");
            if let Some(previous) = operations.insert(name.clone(), op) {
                warn!(
                    name = %name,
                    replaced = %previous.endpoint.path,
                    by = %endpoint.path,
                    "Operation name collision, last registration wins"
                );
            }
        }
        Self { operations }
    }

    /// Look up by synthesized name, falling back to the raw alias.
    pub fn get(&self, name_or_alias: &str) -> Option<&AliasOperation> {
        self.operations
            .get(name_or_alias)
            .or_else(|| self.operations.get(&operation_name(name_or_alias)))
    }

    pub fn iter(&self) -> impl Iterator<Item = &AliasOperation> {
        self.operations.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.operations.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
