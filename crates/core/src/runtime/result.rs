//! Call results.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::CallError;
use crate::route::RouteContract;
use crate::types::TypeExpr;

/// The raw HTTP exchange behind a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// Status code
    pub status: u16,
    /// Final request URL
    pub url: String,
    /// Response headers in received order
    pub headers: Vec<(String, String)>,
    /// Body bytes; empty for streamed bodies
    pub body: Vec<u8>,
}

impl RawResponse {
    /// First header value with the given name, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Outcome of one call.
///
/// `schema` is the response schema the route declares for `status`, `None`
/// for an undeclared status.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResult<D = Value> {
    /// Received status
    pub status: u16,
    /// Declared schema of the body for this status
    pub schema: Option<TypeExpr>,
    /// Decoded body
    pub data: D,
    /// Raw response
    pub response: RawResponse,
}

/// Body of a streaming call.
#[derive(Debug)]
pub enum StreamData<S> {
    /// Default status: lazily decoded JSON lines
    Lines(S),
    /// Any other status: the fully read body
    Body(Value),
}

impl ApiResult {
    /// Wrap a fully read response.
    ///
    /// Fails with [`CallError::NotDefaultStatus`] when `raise_if_not_default_status`
    /// is set and the status differs from the route's default.
    pub fn new(
        contract: &RouteContract,
        raw: RawResponse,
        raise_if_not_default_status: bool,
    ) -> Result<Self, CallError> {
        let data = decode_body(&raw.body);
        ApiResult::with_data(contract, raw, data).check(contract, raise_if_not_default_status)
    }

    /// Deserialize `data` into `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, CallError> {
        Ok(serde_json::from_value(self.data.clone())?)
    }

    fn check(self, contract: &RouteContract, raise: bool) -> Result<Self, CallError> {
        debug!(route = %contract.name, status = self.status, "Received response.");
        if raise && !self.is_default(contract) {
            return Err(CallError::NotDefaultStatus {
                default_status: contract.default_status,
                result: Box::new(self),
            });
        }
        Ok(self)
    }
}

impl<D> ApiResult<D> {
    pub(crate) fn with_data(contract: &RouteContract, response: RawResponse, data: D) -> Self {
        let schema = contract
            .responses
            .get(&response.status)
            .map(|spec| spec.schema.clone());
        Self {
            status: response.status,
            schema,
            data,
            response,
        }
    }

    /// Whether the status is the route's default status.
    pub fn is_default(&self, contract: &RouteContract) -> bool {
        self.status == contract.default_status
    }

    /// Replace the data, keeping status, schema and response.
    pub fn map<E>(self, f: impl FnOnce(D) -> E) -> ApiResult<E> {
        ApiResult {
            status: self.status,
            schema: self.schema,
            data: f(self.data),
            response: self.response,
        }
    }
}

impl<S> ApiResult<StreamData<S>> {
    /// Wrap a streaming response whose body is still unread.
    pub(crate) fn streaming(
        contract: &RouteContract,
        raw: RawResponse,
        data: StreamData<S>,
        raise_if_not_default_status: bool,
    ) -> Result<Self, CallError> {
        let result = ApiResult::with_data(contract, raw, data);
        if raise_if_not_default_status && !result.is_default(contract) {
            let body = match &result.data {
                StreamData::Body(value) => value.clone(),
                StreamData::Lines(_) => Value::Null,
            };
            return Err(CallError::NotDefaultStatus {
                default_status: contract.default_status,
                result: Box::new(result.map(|_| body)),
            });
        }
        Ok(result)
    }
}

/// Decode a body as JSON, falling back to text; empty bodies are `null`.
pub fn decode_body(body: &[u8]) -> Value {
    if body.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::description::EndpointDescription;
    use crate::route::RouteTranslator;
    use serde_json::json;

    fn contract() -> RouteContract {
        let endpoint: EndpointDescription = serde_json::from_value(json!({
            "name": "get_foo", "path": "/foo", "methods": ["GET"],
            "response_model": {"kind": "builtin", "name": "str"},
            "responses": [{"status": 201, "model": {"kind": "builtin", "name": "int"}}]
        }))
        .unwrap();
        RouteTranslator::new(TypeExpr::local("ClientHTTPValidationError"))
            .translate(&endpoint)
            .unwrap()
    }

    fn raw(status: u16, body: &str) -> RawResponse {
        RawResponse {
            status,
            url: "http://localhost/foo".into(),
            headers: vec![("Content-Type".into(), "application/json".into())],
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_result_for_declared_status() {
        let result = ApiResult::new(&contract(), raw(201, "123"), false).unwrap();
        assert_eq!(result.status, 201);
        assert_eq!(result.data, json!(123));
        assert_eq!(result.schema, Some(TypeExpr::builtin(crate::types::Builtin::Int)));
        assert_eq!(result.decode::<i64>().unwrap(), 123);
        assert_eq!(result.response.header("content-type"), Some("application/json"));
    }

    #[test]
    fn test_undeclared_status_has_no_schema() {
        let result = ApiResult::new(&contract(), raw(500, "oops"), false).unwrap();
        assert_eq!(result.schema, None);
        assert_eq!(result.data, json!("oops"));
    }

    #[test]
    fn test_raise_on_other_status() {
        let err = ApiResult::new(&contract(), raw(201, "123"), true).unwrap_err();
        assert!(matches!(
            &err,
            CallError::NotDefaultStatus { default_status: 200, result }
                if result.status == 201 && result.data == json!(123)
        ));
        assert_eq!(err.to_string(), "Expected status 200, got 201");
        assert!(ApiResult::new(&contract(), raw(200, "\"ok\""), true).is_ok());
    }

    #[test]
    fn test_decode_body() {
        assert_eq!(decode_body(b""), Value::Null);
        assert_eq!(decode_body(b"{\"a\": 1}"), json!({"a": 1}));
        assert_eq!(decode_body(b"plain"), json!("plain"));
    }
}
