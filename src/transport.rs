//! HTTP transport abstraction.
//!
//! Every pipeline stage talks to the network through [`HttpTransport`]
//! rather than holding a `reqwest::Client` directly. Production code uses
//! [`ReqwestTransport`]; tests and embedders can inject any other
//! implementation through [`crate::config::ClientConfigBuilder::transport`].
//!
//! The request/response types are small: the services this
//! crate talks to only need a method, a URL, a few headers and an optional
//! body, and only the status line and raw body come back.

use crate::error::{TransportError, VectorArtError};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

pub use reqwest::Method;

/// An outgoing HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post(url: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            headers: Vec::new(),
            body: Some(body),
        }
    }

    pub fn put(url: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            method: Method::PUT,
            url: url.into(),
            headers: Vec::new(),
            body: Some(body),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Look up a header value by case-insensitive name.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A fully-read HTTP response.
///
/// `status_text` is the canonical reason phrase for `status` (see
/// [`reason_phrase`]), not the phrase the server put on its status line:
/// reqwest does not expose the latter. A service answering `503 Busy`
/// therefore reports `Service Unavailable`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Canonical reason phrase for `status`, or `HTTP <code>` if unknown.
    pub status_text: String,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Build a response with the canonical reason phrase for `status`.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            status_text: reason_phrase(status),
            body: body.into(),
        }
    }

    /// A `200 OK` response carrying `body`.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::new(200, body)
    }

    /// A `200 OK` response carrying `value` serialised as JSON.
    pub fn json(value: &serde_json::Value) -> Self {
        Self::ok(value.to_string())
    }

    /// An empty response with the given status code.
    pub fn status(status: u16) -> Self {
        Self::new(status, Vec::new())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The body decoded as UTF-8 (lossy).
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// The body parsed as JSON.
    pub fn parse_json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Canonical reason phrase for a status code, or `HTTP <code>` if unknown.
pub fn reason_phrase(status: u16) -> String {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {status}"))
}

/// Sends HTTP requests on behalf of the pipeline stages.
///
/// Implementations must be `Send + Sync`; a single transport is shared by
/// the upload, job and download stages of one workflow.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send `request` and read the whole response body.
    ///
    /// Non-2xx responses are returned as `Ok`; only failures that prevent a
    /// response from existing at all (DNS, TLS, timeouts) are `Err`.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// [`HttpTransport`] backed by a pooled [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport whose requests each time out after `timeout_secs`.
    pub fn new(timeout_secs: u64) -> Result<Self, VectorArtError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| VectorArtError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        debug!("{} {}", request.method, request.url);

        let mut builder = self.client.request(request.method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError(format!("request timed out: {e}"))
            } else {
                TransportError(e.to_string())
            }
        })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError(format!("failed to read body: {e}")))?;

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: reason_phrase(status.as_u16()),
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_range() {
        assert!(HttpResponse::status(200).is_success());
        assert!(HttpResponse::status(204).is_success());
        assert!(!HttpResponse::status(302).is_success());
        assert!(!HttpResponse::status(404).is_success());
        assert!(!HttpResponse::status(500).is_success());
    }

    #[test]
    fn reason_phrase_known_and_unknown() {
        assert_eq!(reason_phrase(404), "Not Found");
        assert_eq!(reason_phrase(503), "Service Unavailable");
        assert_eq!(reason_phrase(599), "HTTP 599");
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let req = HttpRequest::put("https://signed", b"x".to_vec()).header("Content-Type", "image/png");
        assert_eq!(req.header_value("content-type"), Some("image/png"));
        assert_eq!(req.header_value("accept"), None);
    }

    #[test]
    fn json_body_round_trips_through_parse() {
        let resp = HttpResponse::json(&serde_json::json!({ "jobId": "abc" }));
        let v: serde_json::Value = resp.parse_json().unwrap();
        assert_eq!(v["jobId"], "abc");
    }

    #[test]
    fn reqwest_transport_builds() {
        assert!(ReqwestTransport::new(5).is_ok());
    }
}
