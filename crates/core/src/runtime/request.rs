//! Request construction from a route contract and argument values.

use std::time::Duration;

use indexmap::IndexMap;
use reqwest::Url;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::CallError;
use crate::route::{Binding, DefaultValue, HttpMethod, ParameterSpec, RouteContract};

/// Per-call overrides, the Rust side of `ClientExts`.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Request timeout; the client default applies when unset
    pub timeout: Option<Duration>,
    /// Extra headers; each replaces a route header of the same name
    pub headers: Vec<(String, String)>,
    /// Fail with [`CallError::NotDefaultStatus`] on any other status
    pub raise_if_not_default_status: bool,
}

/// A request ready to hand to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Path with placeholders substituted and percent-encoded
    pub path: String,
    /// Query pairs; sequences appear as repeated keys
    pub query: Vec<(String, String)>,
    /// Headers, including `cookie` and `content-type` when needed
    pub headers: Vec<(String, String)>,
    /// Compact JSON body
    pub body: Option<Vec<u8>>,
}

impl PreparedRequest {
    /// Absolute URL of this request under `base`.
    pub fn url(&self, base: &Url) -> Result<Url, CallError> {
        let mut base = base.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let mut url = base
            .join(self.path.trim_start_matches('/'))
            .map_err(|err| CallError::InvalidUrl(format!("{}: {err}", self.path)))?;
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }
        Ok(url)
    }
}

/// Build the request for `contract` from named argument values.
///
/// Arguments are keyed by parameter name. Missing optional arguments take
/// their literal default or are left out; missing required ones fail.
pub fn build_request(
    contract: &RouteContract,
    args: &IndexMap<String, Value>,
) -> Result<PreparedRequest, CallError> {
    for name in args.keys() {
        if !contract.parameters.iter().any(|p| &p.name == name) {
            return Err(CallError::InvalidArgument {
                name: name.clone(),
                reason: format!("route '{}' has no such parameter", contract.name),
            });
        }
    }

    let mut path = contract.path_template.clone();
    let mut query = Vec::new();
    let mut headers = Vec::new();
    let mut cookies = Vec::new();
    let mut body_fields = Map::new();
    let mut body = None;

    for param in &contract.parameters {
        let Some(value) = argument(contract, param, args)? else {
            continue;
        };
        match param.binding {
            Binding::Path => {
                let text = scalar_text(&param.name, value)?;
                path = path.replace(
                    &format!("{{{}}}", param.wire_name),
                    &encode_path_segment(&text),
                );
            }
            Binding::Query => match value {
                // A query model contributes one entry per field.
                Value::Object(fields) => {
                    for (key, field) in fields {
                        push_query(&mut query, &param.name, key, field)?;
                    }
                }
                value => push_query(&mut query, &param.name, &param.wire_name, value)?,
            },
            Binding::Header if !value.is_null() => {
                headers.push((param.wire_name.clone(), scalar_text(&param.name, value)?));
            }
            Binding::Cookie if !value.is_null() => {
                cookies.push(format!("{}={}", param.wire_name, scalar_text(&param.name, value)?));
            }
            Binding::Header | Binding::Cookie => {}
            Binding::BodyEmbedded => {
                body_fields.insert(param.wire_name.clone(), value.clone());
            }
            Binding::BodyUnembedded => body = Some(value.clone()),
        }
    }

    if !cookies.is_empty() {
        warn!(route = %contract.name, "Sending cookies per request; prefer setting them on the client.");
        headers.push(("cookie".to_string(), cookies.join("; ")));
    }
    if !body_fields.is_empty() {
        body = Some(Value::Object(body_fields));
    }
    let body = body.map(|value| serde_json::to_vec(&value)).transpose()?;
    if body.is_some() {
        headers.push(("content-type".to_string(), "application/json".to_string()));
    }

    debug!(
        route = %contract.name,
        method = %contract.http_method,
        path = %path,
        query = query.len(),
        "Prepared request."
    );
    Ok(PreparedRequest {
        method: contract.http_method,
        path,
        query,
        headers,
        body,
    })
}

/// The value to send for `param`, `None` when it is left out.
fn argument<'a>(
    contract: &RouteContract,
    param: &'a ParameterSpec,
    args: &'a IndexMap<String, Value>,
) -> Result<Option<&'a Value>, CallError> {
    if let Some(value) = args.get(&param.name) {
        return Ok(Some(value));
    }
    match &param.default {
        Some(DefaultValue::Literal(value)) => Ok(Some(value)),
        Some(DefaultValue::Unset) => Ok(None),
        None if param.required => Err(CallError::MissingArgument {
            route: contract.name.clone(),
            name: param.name.clone(),
        }),
        None => Ok(None),
    }
}

/// Append `value` under `key`; sequences repeat the key and nulls are dropped.
fn push_query(
    query: &mut Vec<(String, String)>,
    name: &str,
    key: &str,
    value: &Value,
) -> Result<(), CallError> {
    match value {
        Value::Null => {}
        Value::Array(items) => {
            for item in items.iter().filter(|item| !item.is_null()) {
                query.push((key.to_string(), scalar_text(name, item)?));
            }
        }
        value => query.push((key.to_string(), scalar_text(name, value)?)),
    }
    Ok(())
}

/// Text form of a scalar, the way it appears in paths, queries and headers.
fn scalar_text(name: &str, value: &Value) -> Result<String, CallError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => Err(CallError::InvalidArgument {
            name: name.to_string(),
            reason: format!("expected a scalar, got {value}"),
        }),
    }
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
fn encode_path_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}
