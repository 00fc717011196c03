//! Blocking route caller on `reqwest::blocking`.

use std::io::BufReader;

use indexmap::IndexMap;
use reqwest::Url;
use reqwest::blocking::{Client, Response};
use serde_json::Value;
use tracing::debug;

use super::request::{CallOptions, PreparedRequest, build_request};
use super::{header_map, raw_response, reqwest_method};
use super::result::{ApiResult, RawResponse, StreamData, decode_body};
use super::stream::JsonLines;
use crate::error::CallError;
use crate::route::RouteContract;

/// Lines of a blocking streamed body.
pub type BlockingLines = JsonLines<BufReader<Response>>;

/// Calls routes against one base URL, blocking per call and per stream element.
///
/// Must not be used from inside an async runtime.
#[derive(Debug, Clone)]
pub struct RouteCaller {
    client: Client,
    base_url: Url,
}

impl RouteCaller {
    /// Caller with a default client.
    pub fn new(base_url: &str) -> Result<Self, CallError> {
        Self::with_client(Client::new(), base_url)
    }

    /// Caller reusing an existing client.
    pub fn with_client(client: Client, base_url: &str) -> Result<Self, CallError> {
        let base_url =
            Url::parse(base_url).map_err(|err| CallError::InvalidUrl(format!("{base_url}: {err}")))?;
        Ok(Self { client, base_url })
    }

    /// Call a route and read the whole body.
    pub fn call(
        &self,
        contract: &RouteContract,
        args: &IndexMap<String, Value>,
        options: &CallOptions,
    ) -> Result<ApiResult, CallError> {
        let response = self.send(contract, args, options)?;
        let mut raw = raw_parts(&response);
        raw.body = response.bytes()?.to_vec();
        ApiResult::new(contract, raw, options.raise_if_not_default_status)
    }

    /// Call a streaming route.
    ///
    /// On the default status the body is left unread and exposed as
    /// [`StreamData::Lines`]; any other status is read whole.
    pub fn call_stream(
        &self,
        contract: &RouteContract,
        args: &IndexMap<String, Value>,
        options: &CallOptions,
    ) -> Result<ApiResult<StreamData<BlockingLines>>, CallError> {
        let response = self.send(contract, args, options)?;
        let mut raw = raw_parts(&response);
        let data = if raw.status == contract.default_status {
            StreamData::Lines(JsonLines::new(BufReader::new(response)))
        } else {
            raw.body = response.bytes()?.to_vec();
            StreamData::Body(decode_body(&raw.body))
        };
        ApiResult::streaming(contract, raw, data, options.raise_if_not_default_status)
    }

    fn send(
        &self,
        contract: &RouteContract,
        args: &IndexMap<String, Value>,
        options: &CallOptions,
    ) -> Result<Response, CallError> {
        let prepared = build_request(contract, args)?;
        let url = prepared.url(&self.base_url)?;
        debug!(route = %contract.name, %url, "Sending request.");
        let PreparedRequest {
            method,
            headers,
            body,
            ..
        } = prepared;

        let mut request = self
            .client
            .request(reqwest_method(method), url)
            .headers(header_map(&headers, &options.headers)?);
        if let Some(body) = body {
            request = request.body(body);
        }
        if let Some(timeout) = options.timeout {
            request = request.timeout(timeout);
        }
        Ok(request.send()?)
    }
}

fn raw_parts(response: &Response) -> RawResponse {
    raw_response(response.status(), response.url(), response.headers())
}
