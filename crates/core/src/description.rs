//! Service description input model.
//!
//! The description is a JSON document produced from a live service object
//! (outside this crate). It lists endpoints with their bindings, declared
//! responses, and dependency trees whose parameters are merged into the
//! endpoint's own.

use serde::{Deserialize, Serialize};

use crate::error::GenerateError;
use crate::types::TypeExpr;

/// A whole service: a title and its endpoints in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDescription {
    /// Human readable service title, used to derive the client class name
    #[serde(default)]
    pub title: Option<String>,
    /// Endpoints in declaration order
    #[serde(default)]
    pub endpoints: Vec<EndpointDescription>,
}

impl ServiceDescription {
    /// Parse a description from JSON text.
    pub fn from_json(json: &str) -> Result<Self, GenerateError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// One routed endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointDescription {
    /// Route name, used as the generated method name
    pub name: String,
    /// Path template, e.g. `/items/{item_id}`
    pub path: String,
    /// HTTP methods; exactly one is supported
    #[serde(default)]
    pub methods: Vec<String>,
    /// Declared success status, defaults to 200
    #[serde(default)]
    pub status_code: Option<u16>,
    /// Schema of the success response
    #[serde(default)]
    pub response_model: Option<TypeExpr>,
    /// Additional declared responses
    #[serde(default)]
    pub responses: Vec<ResponseDescription>,
    /// Parameters declared directly on the endpoint
    #[serde(default)]
    pub parameters: Vec<ParamDescription>,
    /// Dependencies contributing further parameters
    #[serde(default)]
    pub dependencies: Vec<DependencyDescription>,
    /// Success response is a stream of JSON lines
    #[serde(default)]
    pub streaming: bool,
    /// Embed a single body parameter under its name
    #[serde(default)]
    pub embed_body: bool,
    /// One-line summary
    #[serde(default)]
    pub summary: Option<String>,
    /// Longer description
    #[serde(default)]
    pub description: Option<String>,
    /// Endpoint is deprecated
    #[serde(default)]
    pub deprecated: bool,
}

/// A declared non-default response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseDescription {
    /// Status code
    pub status: u16,
    /// Response schema, `typing.Any` when missing
    #[serde(default)]
    pub model: Option<TypeExpr>,
    /// Human readable description
    #[serde(default)]
    pub description: Option<String>,
}

/// A dependency node: its own parameters plus nested dependencies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyDescription {
    /// Dependency name, informational
    #[serde(default)]
    pub name: Option<String>,
    /// Parameters declared by this dependency
    #[serde(default)]
    pub parameters: Vec<ParamDescription>,
    /// Nested dependencies
    #[serde(default)]
    pub dependencies: Vec<DependencyDescription>,
}

/// Where a parameter travels in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    /// Path placeholder
    Path,
    /// Query string
    Query,
    /// Request header
    Header,
    /// Cookie
    Cookie,
    /// JSON body
    Body,
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDescription {
    /// Python-side name
    pub name: String,
    /// Wire name when it differs from the Python name
    #[serde(default)]
    pub alias: Option<String>,
    /// Binding location
    #[serde(rename = "in")]
    pub location: ParamLocation,
    /// Declared type
    #[serde(rename = "type")]
    pub ty: TypeExpr,
    /// Explicit requiredness; inferred from `default` when absent
    #[serde(default)]
    pub required: Option<bool>,
    /// Server-side default value; an explicit `null` is `Some(Value::Null)`
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub default: Option<serde_json::Value>,
    /// Embed a body parameter under its name
    #[serde(default)]
    pub embed: bool,
    /// Validation metadata (`ge`, `max_length`, ...)
    #[serde(default)]
    pub constraints: Option<serde_json::Map<String, serde_json::Value>>,
}

impl ParamDescription {
    /// Whether the caller must supply the parameter.
    pub fn is_required(&self) -> bool {
        self.location == ParamLocation::Path
            || self.required.unwrap_or(self.default.is_none())
    }
}

/// Keep an explicit `null` apart from an absent field.
fn present_value<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

/// Merge an endpoint's parameters with its dependency tree.
///
/// Endpoint parameters come first, then each dependency depth-first: its own
/// parameters before those of its sub-dependencies, in declaration order.
pub fn flatten_parameters(endpoint: &EndpointDescription) -> Vec<&ParamDescription> {
    fn walk<'a>(dependency: &'a DependencyDescription, out: &mut Vec<&'a ParamDescription>) {
        out.extend(dependency.parameters.iter());
        for nested in &dependency.dependencies {
            walk(nested, out);
        }
    }

    let mut params: Vec<&ParamDescription> = endpoint.parameters.iter().collect();
    for dependency in &endpoint.dependencies {
        walk(dependency, &mut params);
    }
    params
}
