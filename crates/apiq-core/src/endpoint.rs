//! Endpoint descriptors.

use serde::{Deserialize, Serialize};

use crate::method::Method;

/// Where a declared parameter travels in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    /// `:name` segment of the path template.
    Path,
    /// Query string parameter.
    Query,
    /// Request header.
    Header,
    /// The request body.
    Body,
}

/// A declared parameter of an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSpec {
    /// Parameter name.
    pub name: String,
    /// Where the parameter is sent.
    #[serde(rename = "type")]
    pub kind: ParamKind,
    /// Whether callers must supply it.
    #[serde(default)]
    pub required: bool,
    /// Name of the schema describing the value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ParameterSpec {
    /// Create a parameter spec.
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            schema: None,
            description: None,
        }
    }

    /// Mark the parameter as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Attach a schema name.
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }
}

/// One declared HTTP endpoint.
///
/// Descriptors are created once at API-definition time and never mutated
/// after they are placed in an [`EndpointRegistry`](crate::EndpointRegistry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointDescriptor {
    /// HTTP method.
    pub method: Method,
    /// Path template (e.g., "/users/:id").
    pub path: String,
    /// Short unique name used to synthesize a convenience operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// A POST that is semantically a read (e.g., a search).
    #[serde(default, skip_serializing_if = "is_false")]
    pub immutable: bool,
    /// Declared parameters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterSpec>,
    /// Name of the schema describing the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl EndpointDescriptor {
    /// Create a descriptor for a method and path template.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            alias: None,
            description: None,
            immutable: false,
            parameters: Vec::new(),
            response: None,
        }
    }

    /// Create a GET descriptor.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    /// Create a POST descriptor.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    /// Create a PUT descriptor.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    /// Create a PATCH descriptor.
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    /// Create a DELETE descriptor.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Set the alias.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Flag a POST endpoint as a read.
    pub fn immutable(mut self) -> Self {
        self.immutable = true;
        self
    }

    /// Declare a parameter.
    pub fn with_parameter(mut self, parameter: ParameterSpec) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Set the response schema name.
    pub fn with_response(mut self, schema: impl Into<String>) -> Self {
        self.response = Some(schema.into());
        self
    }

    /// The alias, if present and non-empty.
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref().filter(|a| !a.is_empty())
    }

    /// Whether this is a POST that reads (cacheable like a GET).
    pub fn is_immutable_query(&self) -> bool {
        self.method == Method::Post && self.immutable
    }

    /// Names of the `:name` segments of the path template, in order.
    pub fn path_params(&self) -> Vec<&str> {
        path_param_names(&self.path)
    }

    /// The declared body parameter, if any.
    pub fn body_spec(&self) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.kind == ParamKind::Body)
    }

    /// Declared parameters of one kind.
    pub fn parameters_of(&self, kind: ParamKind) -> impl Iterator<Item = &ParameterSpec> {
        self.parameters.iter().filter(move |p| p.kind == kind)
    }
}

/// Names of the `:name` segments of a path template, in order.
pub fn path_param_names(template: &str) -> Vec<&str> {
    template
        .split('/')
        .filter_map(|segment| segment.strip_prefix(':'))
        .filter(|name| !name.is_empty())
        .collect()
}
