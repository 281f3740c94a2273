//! API Request
//!
//! Request-building structure passed through the interceptor chain. Every builder method
//! consumes the request and returns the modified copy.

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

use crate::core::{HttpMethod, HttpRequest};
use crate::error::{ConfigurationError, ProtocolError, TrueLayerResult};
use crate::types::config::append_path;
use crate::types::{names, Headers};

/// Outgoing API request, before transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiRequest {
    method: HttpMethod,
    path: String,
    headers: BTreeMap<String, String>,
    body: Option<String>,
    authenticated: bool,
    signed: bool,
}

impl ApiRequest {
    /// New request; authenticated by default, never signed by default.
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: BTreeMap::new(),
            body: None,
            authenticated: true,
            signed: false,
        }
    }

    /// New `GET` request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// New `POST` request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    /// Set a JSON body.
    pub fn json<B: Serialize + ?Sized>(self, body: &B) -> TrueLayerResult<Self> {
        let body = serde_json::to_string(body).map_err(|e| ProtocolError::InvalidRequest {
            message: format!("request body could not be serialized: {e}"),
        })?;
        Ok(self
            .body(body)
            .header(names::CONTENT_TYPE, "application/json"))
    }

    /// Set a raw body.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set a header, replacing any previous value. Names are case-insensitive.
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Merge caller-supplied headers.
    pub fn headers(self, headers: &Headers) -> Self {
        headers
            .to_pairs()
            .into_iter()
            .fold(self, |request, (name, value)| request.header(name, value))
    }

    /// Whether the request needs a bearer token.
    pub fn authenticated(mut self, authenticated: bool) -> Self {
        self.authenticated = authenticated;
        self
    }

    /// Whether the request must carry a `Tl-Signature`.
    pub fn signed(mut self, signed: bool) -> Self {
        self.signed = signed;
        self
    }

    /// HTTP method.
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Path (and query), appended to the API base URL path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Body bytes; empty when no body is set.
    pub fn body_bytes(&self) -> &[u8] {
        self.body.as_deref().map(str::as_bytes).unwrap_or_default()
    }

    /// Header value, looked up case-insensitively.
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Whether the header is present.
    pub fn has_header(&self, name: &str) -> bool {
        self.get_header(name).is_some()
    }

    /// Whether a bearer token will be attached.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Whether a `Tl-Signature` will be attached.
    pub fn is_signed(&self) -> bool {
        self.signed
    }

    /// Resolve against `base_url` into a transport request.
    pub fn into_http_request(
        self,
        base_url: &Url,
        timeout: Option<Duration>,
    ) -> TrueLayerResult<HttpRequest> {
        let url =
            append_path(base_url, &self.path).ok_or_else(|| ConfigurationError::InvalidUrl {
                field: "path".to_string(),
                url: format!("{base_url}{}", self.path),
            })?;

        Ok(HttpRequest {
            method: self.method,
            url: url.to_string(),
            headers: self.headers.into_iter().collect(),
            body: self.body,
            timeout,
        })
    }
}
