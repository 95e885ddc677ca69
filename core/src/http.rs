//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The
//! client builds `HttpRequest` values and parses `HttpResponse` values
//! without touching the network itself; an `HttpExecutor` performs the
//! round-trip. Tests substitute a scripted executor, production code uses
//! `ReqwestExecutor`.
//!
//! All fields use owned types (`String`, `Vec`) so values can be recorded,
//! replayed and compared freely.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
///
/// Built by `ApiClient::build_request`. `timeout` is carried on the request
/// so executors can enforce it at the socket level as well.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    pub timeout: Duration,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failure to complete a round-trip at all (no status code observed).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportFailure {
    #[error("timed out")]
    Timeout,
    #[error("unreachable: {0}")]
    Unreachable(String),
}

/// Performs one HTTP round-trip.
///
/// Implementations must return non-2xx replies as `Ok(HttpResponse)`; only
/// failures where no response was received are `Err`.
#[async_trait]
pub trait HttpExecutor: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportFailure>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_ignores_case() {
        let request = HttpRequest {
            method: HttpMethod::Get,
            url: "http://localhost/v1".to_string(),
            headers: vec![("Authorization".to_string(), "Bearer t".to_string())],
            body: None,
            timeout: Duration::from_secs(1),
        };
        assert_eq!(request.header("authorization"), Some("Bearer t"));
        assert_eq!(request.header("content-type"), None);
    }

    #[test]
    fn success_range() {
        let mut response = HttpResponse {
            status: 204,
            headers: Vec::new(),
            body: String::new(),
        };
        assert!(response.is_success());
        response.status = 401;
        assert!(!response.is_success());
    }
}
