//! Route translation.
//!
//! Turns one [`EndpointDescription`] into a [`RouteContract`]: the merged and
//! ordered parameter list, the per-status response variants and the default
//! status that decides the narrowed result type.

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use crate::description::{EndpointDescription, ParamDescription, ParamLocation, flatten_parameters};
use crate::error::{GenerateError, GenerationWarning, WarningKind};
use crate::types::{Builtin, TypeExpr};
use crate::utils::is_identifier;

/// Trailing keyword-only call options added to every generated method.
pub const CONTROL_PARAMS: [&str; 2] = ["client_exts", "raise_if_not_default_status"];

/// Members of the client base classes that routes cannot be named after.
pub const RESERVED_ROUTE_NAMES: [&str; 5] =
    ["close", "aclose", "from_base_url", "_request", "_client"];

/// Status used for the synthesized validation-error response.
pub const VALIDATION_ERROR_STATUS: u16 = 422;

/// Status assumed when a route declares none.
pub const DEFAULT_SUCCESS_STATUS: u16 = 200;

/// Supported HTTP methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
    /// HEAD
    Head,
    /// OPTIONS
    Options,
    /// TRACE
    Trace,
}

impl HttpMethod {
    /// Parse a method name, case-insensitively.
    pub fn parse(method: &str) -> Option<Self> {
        let method = match method.to_ascii_uppercase().as_str() {
            "GET" => HttpMethod::Get,
            "POST" => HttpMethod::Post,
            "PUT" => HttpMethod::Put,
            "PATCH" => HttpMethod::Patch,
            "DELETE" => HttpMethod::Delete,
            "HEAD" => HttpMethod::Head,
            "OPTIONS" => HttpMethod::Options,
            "TRACE" => HttpMethod::Trace,
            _ => return None,
        };
        Some(method)
    }

    /// Upper-case method name.
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Trace => "TRACE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a parameter is carried by the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Binding {
    /// Substituted into the path template
    Path,
    /// Query string, repeated keys for sequences
    Query,
    /// Request header
    Header,
    /// Cookie header
    Cookie,
    /// Member of a JSON object body, keyed by wire name
    BodyEmbedded,
    /// The whole JSON body
    BodyUnembedded,
}

impl Binding {
    /// True for both body bindings.
    pub fn is_body(self) -> bool {
        matches!(self, Binding::BodyEmbedded | Binding::BodyUnembedded)
    }
}

/// Default of an optional parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    /// A scalar JSON value written as a Python literal
    Literal(Value),
    /// Omitted from the request unless supplied; the server default applies
    Unset,
}

/// One parameter of a route contract.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    /// Python-side name
    pub name: String,
    /// Name on the wire (alias, or header spelling)
    pub wire_name: String,
    /// Transport binding
    pub binding: Binding,
    /// Declared type
    pub ty: TypeExpr,
    /// Caller must supply the value
    pub required: bool,
    /// Default for optional parameters, `None` when required
    pub default: Option<DefaultValue>,
    /// Must be passed by keyword
    pub keyword_only: bool,
}

/// One response variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSpec {
    /// Status code
    pub status: u16,
    /// Schema of the decoded body
    pub schema: TypeExpr,
    /// Human readable description
    pub description: Option<String>,
}

/// Fully specified method contract for one route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteContract {
    /// Method name
    pub name: String,
    /// HTTP method
    pub http_method: HttpMethod,
    /// Path template with converters stripped
    pub path_template: String,
    /// Parameters in signature order
    pub parameters: Vec<ParameterSpec>,
    /// Responses, default status first
    pub responses: IndexMap<u16, ResponseSpec>,
    /// Status the caller normally expects
    pub default_status: u16,
    /// Default response is a stream of JSON lines
    pub streaming: bool,
    /// One-line summary
    pub summary: Option<String>,
    /// Longer description
    pub description: Option<String>,
    /// Route is deprecated
    pub deprecated: bool,
    /// Non-fatal observations
    pub warnings: Vec<GenerationWarning>,
}

impl RouteContract {
    /// The default response variant.
    pub fn default_response(&self) -> Option<&ResponseSpec> {
        self.responses.get(&self.default_status)
    }

    /// Parameters with the given binding, in signature order.
    pub fn params_with(&self, binding: Binding) -> impl Iterator<Item = &ParameterSpec> {
        self.parameters.iter().filter(move |p| p.binding == binding)
    }
}

/// Translates endpoint descriptions, remembering route names across one run.
#[derive(Debug)]
pub struct RouteTranslator {
    validation_error: TypeExpr,
    seen_names: HashSet<String>,
}

impl RouteTranslator {
    /// Create a translator; `validation_error` is the schema of synthesized 422 responses.
    pub fn new(validation_error: TypeExpr) -> Self {
        Self {
            validation_error,
            seen_names: HashSet::new(),
        }
    }

    /// Translate one endpoint.
    pub fn translate(
        &mut self,
        endpoint: &EndpointDescription,
    ) -> Result<RouteContract, GenerateError> {
        let route = endpoint.name.clone();
        if !is_identifier(&route) {
            return Err(GenerateError::InvalidRouteName { name: route });
        }
        if RESERVED_ROUTE_NAMES.contains(&route.as_str()) || route.starts_with("__") {
            return Err(GenerateError::ReservedRouteName { name: route });
        }
        if self.seen_names.contains(&route) {
            return Err(GenerateError::DuplicateRouteName { name: route });
        }

        let [method] = endpoint.methods.as_slice() else {
            return Err(GenerateError::MethodCount {
                route,
                count: endpoint.methods.len(),
            });
        };
        let http_method =
            HttpMethod::parse(method).ok_or_else(|| GenerateError::UnsupportedMethod {
                route: route.clone(),
                method: method.clone(),
            })?;

        if endpoint.path.trim().is_empty() {
            return Err(GenerateError::EmptyPath { route });
        }

        let mut warnings = Vec::new();
        let parameters = translate_parameters(endpoint, &mut warnings)?;
        let (path_template, placeholders) = strip_converters(&endpoint.path);
        for placeholder in placeholders {
            let known = parameters
                .iter()
                .any(|p| p.binding == Binding::Path && p.wire_name == placeholder);
            if !known {
                warnings.push(GenerationWarning {
                    route: route.clone(),
                    kind: WarningKind::UnknownPlaceholder { placeholder },
                });
            }
        }

        let responses = self.translate_responses(endpoint, !parameters.is_empty());
        let default_status = endpoint.status_code.unwrap_or(DEFAULT_SUCCESS_STATUS);

        debug!(
            route = %route,
            method = %http_method,
            params = parameters.len(),
            responses = responses.len(),
            "Translated route."
        );

        self.seen_names.insert(route.clone());
        Ok(RouteContract {
            name: route,
            http_method,
            path_template,
            parameters,
            responses,
            default_status,
            streaming: endpoint.streaming,
            summary: endpoint.summary.clone(),
            description: endpoint.description.clone(),
            deprecated: endpoint.deprecated,
            warnings,
        })
    }

    fn translate_responses(
        &self,
        endpoint: &EndpointDescription,
        has_parameters: bool,
    ) -> IndexMap<u16, ResponseSpec> {
        let default_status = endpoint.status_code.unwrap_or(DEFAULT_SUCCESS_STATUS);
        let declared_default = endpoint
            .responses
            .iter()
            .find(|r| r.status == default_status);

        let mut schema = endpoint
            .response_model
            .clone()
            .or_else(|| declared_default.and_then(|r| r.model.clone()))
            .unwrap_or_else(|| empty_or_any(default_status));
        if endpoint.streaming {
            let item = schema.sequence_item().cloned().unwrap_or(schema);
            schema = TypeExpr::sequence_of(item);
        }

        let mut responses = IndexMap::new();
        responses.insert(
            default_status,
            ResponseSpec {
                status: default_status,
                schema,
                description: declared_default.and_then(|r| r.description.clone()),
            },
        );
        for response in &endpoint.responses {
            if responses.contains_key(&response.status) {
                continue;
            }
            responses.insert(
                response.status,
                ResponseSpec {
                    status: response.status,
                    schema: response
                        .model
                        .clone()
                        .unwrap_or_else(|| empty_or_any(response.status)),
                    description: response.description.clone(),
                },
            );
        }
        if has_parameters && !responses.contains_key(&VALIDATION_ERROR_STATUS) {
            responses.insert(
                VALIDATION_ERROR_STATUS,
                ResponseSpec {
                    status: VALIDATION_ERROR_STATUS,
                    schema: self.validation_error.clone(),
                    description: Some("Validation Error".to_string()),
                },
            );
        }
        responses
    }
}

fn translate_parameters(
    endpoint: &EndpointDescription,
    warnings: &mut Vec<GenerationWarning>,
) -> Result<Vec<ParameterSpec>, GenerateError> {
    let route = &endpoint.name;
    let params = flatten_parameters(endpoint);

    let mut names = HashSet::new();
    for param in &params {
        if CONTROL_PARAMS.contains(&param.name.as_str()) || param.name == "self" {
            return Err(GenerateError::ReservedParameterName {
                route: route.clone(),
                name: param.name.clone(),
            });
        }
        if !is_identifier(&param.name) {
            return Err(GenerateError::InvalidParameterName {
                route: route.clone(),
                name: param.name.clone(),
            });
        }
        if !names.insert(param.name.as_str()) {
            return Err(GenerateError::DuplicateParameter {
                route: route.clone(),
                name: param.name.clone(),
            });
        }
    }

    let body_count = params
        .iter()
        .filter(|p| p.location == ParamLocation::Body)
        .count();
    let embed_all = body_count > 1
        || endpoint.embed_body
        || params
            .iter()
            .any(|p| p.location == ParamLocation::Body && p.embed);

    let mut positional = Vec::new();
    let mut keyword_only = Vec::new();
    for param in params {
        let spec = translate_parameter(route, param, embed_all, body_count, warnings);
        if spec.keyword_only {
            keyword_only.push(spec);
        } else {
            positional.push(spec);
        }
    }

    // Stable partition: required first, defaulted after.
    let (required, defaulted): (Vec<_>, Vec<_>) =
        positional.into_iter().partition(|p| p.required);
    Ok(required
        .into_iter()
        .chain(defaulted)
        .chain(keyword_only)
        .collect())
}

fn translate_parameter(
    route: &str,
    param: &ParamDescription,
    embed_all: bool,
    body_count: usize,
    warnings: &mut Vec<GenerationWarning>,
) -> ParameterSpec {
    let binding = match param.location {
        ParamLocation::Path => Binding::Path,
        ParamLocation::Query => Binding::Query,
        ParamLocation::Header => Binding::Header,
        ParamLocation::Cookie => Binding::Cookie,
        ParamLocation::Body if embed_all => Binding::BodyEmbedded,
        ParamLocation::Body => Binding::BodyUnembedded,
    };

    let wire_name = match (&param.alias, binding) {
        (Some(alias), _) => alias.clone(),
        (None, Binding::Header) => param.name.replace('_', "-"),
        (None, _) => param.name.clone(),
    };

    if binding == Binding::Cookie {
        warnings.push(GenerationWarning {
            route: route.to_string(),
            kind: WarningKind::CookieParameter {
                name: param.name.clone(),
            },
        });
    }
    if param.constraints.as_ref().is_some_and(|c| !c.is_empty()) {
        warnings.push(GenerationWarning {
            route: route.to_string(),
            kind: WarningKind::UnsupportedConstraints {
                name: param.name.clone(),
            },
        });
    }

    let required = param.is_required();
    let default = if required {
        None
    } else if binding.is_body() {
        Some(DefaultValue::Unset)
    } else {
        match &param.default {
            Some(value) if is_scalar(value) => Some(DefaultValue::Literal(value.clone())),
            Some(_) => {
                warnings.push(GenerationWarning {
                    route: route.to_string(),
                    kind: WarningKind::NonScalarDefault {
                        name: param.name.clone(),
                    },
                });
                Some(DefaultValue::Unset)
            }
            None => Some(DefaultValue::Unset),
        }
    };

    // A `None` default must be a valid value of the annotation.
    let ty = if matches!(default, Some(DefaultValue::Literal(Value::Null))) {
        param.ty.clone().or_none()
    } else {
        param.ty.clone()
    };

    ParameterSpec {
        name: param.name.clone(),
        wire_name,
        binding,
        ty,
        required,
        default,
        keyword_only: binding == Binding::BodyEmbedded && body_count > 1,
    }
}

/// Schema of a response without a declared model.
fn empty_or_any(status: u16) -> TypeExpr {
    if matches!(status, 204 | 205 | 304) {
        TypeExpr::builtin(Builtin::None)
    } else {
        TypeExpr::any()
    }
}

fn is_scalar(value: &Value) -> bool {
    matches!(
        value,
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_)
    )
}

/// Remove `:converter` suffixes from placeholders, returning the cleaned
/// template and the placeholder names in order.
fn strip_converters(path: &str) -> (String, Vec<String>) {
    let mut template = String::with_capacity(path.len());
    let mut placeholders = Vec::new();
    let mut rest = path;
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        let inner = &rest[start + 1..start + len];
        let name = inner.split(':').next().unwrap_or(inner).trim();
        template.push_str(&rest[..start]);
        template.push('{');
        template.push_str(name);
        template.push('}');
        placeholders.push(name.to_string());
        rest = &rest[start + len + 1..];
    }
    template.push_str(rest);
    (template, placeholders)
}
