//! # HTTP Transport
//!
//! The client sees HTTP as a single primitive: send one request, get back a
//! status and a body. [`Transport`] captures that, so the pagination and
//! decoding logic can be exercised against canned responses and the network
//! stack can be swapped without touching the client.
//!
//! [`ReqwestTransport`] is the production implementation. Every request
//! carries an independent timeout (60 seconds unless configured otherwise)
//! and is never retried.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Headers whose values are masked in [`HttpRequest::to_curl`].
const CREDENTIAL_HEADERS: [&str; 2] = ["api-secret", "authorization"];

#[derive(Error, Debug)]
pub enum TransportError {
    /// Connection, TLS, timeout or protocol failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Failure reported by a non-reqwest transport
    #[error("{0}")]
    Other(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// A fully built request.
#[derive(Clone, Debug, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn get(url: Url) -> Self {
        HttpRequest {
            method: Method::Get,
            url,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post(url: Url, body: Vec<u8>) -> Self {
        HttpRequest {
            method: Method::Post,
            url,
            headers: Vec::new(),
            body: Some(body),
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// First value of the named header, compared case-insensitively.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Render as a curl command for debugging. Credential headers are
    /// masked, so the output is safe to log.
    pub fn to_curl(&self) -> String {
        let mut curl = format!("curl -X {} '{}'", self.method.as_str(), self.url);
        for (name, value) in &self.headers {
            let is_credential = CREDENTIAL_HEADERS
                .iter()
                .any(|header| name.eq_ignore_ascii_case(header));
            let value = if is_credential { "***" } else { value.as_str() };
            curl.push_str(&format!(" -H '{}: {}'", name, value));
        }
        if let Some(body) = &self.body {
            let text = String::from_utf8_lossy(body);
            if !text.is_empty() {
                curl.push_str(&format!(" --data '{}'", text));
            }
        }
        curl
    }
}

/// The raw outcome of a request. Status codes are not interpreted here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as text, invalid UTF-8 replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Sends one request and waits for the complete response.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// [`Transport`] backed by a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Wrap an existing client; its timeout settings are used as-is.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = match request.method {
            Method::Get => self.client.get(request.url),
            Method::Post => self.client.post(request.url),
        };

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curl_rendering() {
        let url = Url::parse("https://example.herokuapp.com/api/v2/notifications/loop").unwrap();
        let request = HttpRequest::post(url, br#"{"eventType":"Temporary Override Cancel"}"#.to_vec())
            .header("Content-Type", "application/json")
            .header("api-secret", "abc123");

        assert_eq!(
            request.to_curl(),
            "curl -X POST 'https://example.herokuapp.com/api/v2/notifications/loop' \
             -H 'Content-Type: application/json' -H 'api-secret: ***' \
             --data '{\"eventType\":\"Temporary Override Cancel\"}'"
        );
        assert_eq!(request.header_value("API-SECRET"), Some("abc123"));
    }

    #[test]
    fn test_response_helpers() {
        let ok = HttpResponse { status: 204, body: Vec::new() };
        assert!(ok.is_success());

        let denied = HttpResponse { status: 401, body: b"Unauthorized".to_vec() };
        assert!(!denied.is_success());
        assert_eq!(denied.text(), "Unauthorized");
    }
}
