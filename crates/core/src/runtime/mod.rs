//! Calling routes from Rust.
//!
//! The same contract the generator renders into Python methods drives a
//! reqwest-based caller here: arguments are bound to path, query, headers,
//! cookies and body exactly as the generated `_request` does, and responses
//! come back as [`ApiResult`] values.

pub mod blocking;
pub mod nonblocking;
pub mod request;
pub mod result;
pub mod stream;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode, Url};

pub use blocking::{BlockingLines, RouteCaller};
pub use nonblocking::{AsyncLines, AsyncRouteCaller};
pub use request::{CallOptions, PreparedRequest, build_request};
pub use result::{ApiResult, RawResponse, StreamData};
pub use stream::{JsonLines, json_lines};

use crate::error::CallError;
use crate::route::HttpMethod;

pub(crate) fn reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Head => Method::HEAD,
        HttpMethod::Options => Method::OPTIONS,
        HttpMethod::Trace => Method::TRACE,
    }
}

/// Route headers then per-call headers; a later name replaces an earlier one.
pub(crate) fn header_map(
    route: &[(String, String)],
    extra: &[(String, String)],
) -> Result<HeaderMap, CallError> {
    let mut map = HeaderMap::new();
    for (name, value) in route.iter().chain(extra) {
        let invalid = |reason: String| CallError::InvalidArgument {
            name: name.clone(),
            reason,
        };
        let key = HeaderName::from_bytes(name.as_bytes())
            .map_err(|err| invalid(format!("invalid header name: {err}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|err| invalid(format!("invalid header value: {err}")))?;
        map.insert(key, value);
    }
    Ok(map)
}

pub(crate) fn raw_response(status: StatusCode, url: &Url, headers: &HeaderMap) -> RawResponse {
    RawResponse {
        status: status.as_u16(),
        url: url.to_string(),
        headers: headers
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect(),
        body: Vec::new(),
    }
}
