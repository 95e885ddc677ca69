//! Reqwest-backed `HttpExecutor`.
//!
//! Owns socket-level concerns only: building the reqwest request, applying
//! the per-request timeout and mapping reqwest failures into
//! `TransportFailure`. Status codes are returned untouched.

use async_trait::async_trait;
use reqwest::{Client, Method};

use crate::http::{HttpExecutor, HttpMethod, HttpRequest, HttpResponse, TransportFailure};

/// Production executor over a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestExecutor {
    client: Client,
}

impl ReqwestExecutor {
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpExecutor for ReqwestExecutor {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportFailure> {
        let mut builder = self
            .client
            .request(method(request.method), &request.url)
            .timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(map_transport_error)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_owned(), value.to_owned()))
            })
            .collect();
        let body = response.text().await.map_err(map_transport_error)?;

        Ok(HttpResponse { status, headers, body })
    }
}

fn method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn map_transport_error(error: reqwest::Error) -> TransportFailure {
    if error.is_timeout() {
        TransportFailure::Timeout
    } else {
        TransportFailure::Unreachable(error.to_string())
    }
}
