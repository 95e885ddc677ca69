//! Authenticated transport client for the library backend.
//!
//! # Design
//! `ApiClient` keeps a split between pure request building
//! (`build_request`), pure response parsing (`parse_response`) and the I/O
//! in between, which an `HttpExecutor` performs. `send` drives one logical
//! request through that pipeline:
//!
//! 1. ask the identity provider for a credential (absence is not an error),
//! 2. send with a fixed timeout,
//! 3. on `401`, refresh the credential once and resend,
//! 4. validate the envelope and convert the unwrapped data to `camelCase`.
//!
//! The "already retried" state lives in `send`'s stack frame, never on the
//! client, so concurrent requests each get their own single retry.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::time::Instant;

use crate::case::{to_internal, to_wire};
use crate::config::ClientConfig;
use crate::envelope::{failure_message, unwrap_envelope_str};
use crate::error::SyncError;
use crate::executor::ReqwestExecutor;
use crate::http::{HttpExecutor, HttpMethod, HttpRequest, HttpResponse, TransportFailure};
use crate::identity::{Credential, IdentityProvider};
use crate::telemetry::{RequestEvent, TelemetrySink};

const UNAUTHORIZED: u16 = 401;
const MAX_ATTEMPTS: u8 = 2;
const BODY_PREVIEW_LIMIT: usize = 160;

/// Body of a logical request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Internal (`camelCase`) JSON, converted to wire casing before sending.
    Json(Value),
    /// Opaque bytes sent unmodified.
    Raw { content_type: String, bytes: Vec<u8> },
}

/// One logical operation against the backend, before credentials and
/// encoding are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub path: String,
    pub body: Option<RequestBody>,
    pub headers: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    pub fn raw(mut self, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.body = Some(RequestBody::Raw {
            content_type: content_type.into(),
            bytes,
        });
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Explicitly constructed transport client. Cheap to clone.
#[derive(Clone)]
pub struct ApiClient {
    config: ClientConfig,
    executor: Arc<dyn HttpExecutor>,
    identity: Arc<dyn IdentityProvider>,
    telemetry: Arc<dyn TelemetrySink>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient").field("config", &self.config).finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(
        config: ClientConfig,
        executor: Arc<dyn HttpExecutor>,
        identity: Arc<dyn IdentityProvider>,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Self {
        Self {
            config,
            executor,
            identity,
            telemetry,
        }
    }

    /// Build a client over a fresh `ReqwestExecutor`.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn with_reqwest(
        config: ClientConfig,
        identity: Arc<dyn IdentityProvider>,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Result<Self, reqwest::Error> {
        let executor = ReqwestExecutor::new(&config.user_agent)?;
        Ok(Self::new(config, Arc::new(executor), identity, telemetry))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn telemetry(&self) -> &dyn TelemetrySink {
        self.telemetry.as_ref()
    }

    /// Turn a logical request into a wire request.
    ///
    /// JSON bodies are converted to wire casing; raw bodies pass through.
    /// Caller headers replace the defaults of the same name, but a present
    /// credential always wins over a caller-supplied `Authorization`.
    pub fn build_request(
        &self,
        request: &ApiRequest,
        credential: Option<&Credential>,
    ) -> Result<HttpRequest, SyncError> {
        let mut headers = vec![("accept".to_string(), "application/json".to_string())];
        let body = match &request.body {
            Some(RequestBody::Json(value)) => {
                let encoded = serde_json::to_vec(&to_wire(value))
                    .map_err(|e| SyncError::Serialization { message: e.to_string() })?;
                headers.push(("content-type".to_string(), "application/json".to_string()));
                Some(encoded)
            }
            Some(RequestBody::Raw { content_type, bytes }) => {
                headers.push(("content-type".to_string(), content_type.clone()));
                Some(bytes.clone())
            }
            None => None,
        };

        for (name, value) in &request.headers {
            set_header(&mut headers, name, value.clone());
        }
        if let Some(credential) = credential {
            set_header(&mut headers, "authorization", credential.bearer());
        }

        Ok(HttpRequest {
            method: request.method,
            url: self.config.url_for(&request.path),
            headers,
            body,
            timeout: self.config.timeout,
        })
    }

    /// Classify a response and unwrap its data into internal casing.
    pub fn parse_response(&self, response: HttpResponse) -> Result<Value, SyncError> {
        match response.status {
            200..=299 => {
                let data = unwrap_envelope_str(&response.body)?;
                Ok(to_internal(&data))
            }
            UNAUTHORIZED => Err(SyncError::AuthenticationExpired),
            404 => Err(SyncError::NotFound),
            status => Err(SyncError::Status {
                status,
                message: failure_message(&response.body)
                    .unwrap_or_else(|| body_preview(&response.body)),
            }),
        }
    }

    /// Send one logical request, refreshing the credential at most once.
    pub async fn send(&self, request: ApiRequest) -> Result<Value, SyncError> {
        self.telemetry
            .record_breadcrumb("http", &format!("{} {}", request.method, request.path));

        let mut credential = self.current_credential().await;
        let mut attempt = 1;
        loop {
            let wire = self.build_request(&request, credential.as_ref())?;
            let started = Instant::now();
            let outcome = self.execute(wire).await;
            let mut event = RequestEvent {
                method: request.method,
                endpoint: request.path.clone(),
                status: None,
                duration: started.elapsed(),
                attempt,
            };

            let response = match outcome {
                Ok(response) => response,
                Err(error) => {
                    self.telemetry
                        .record_request_error(&event, error.kind(), &error.to_string());
                    return Err(error);
                }
            };
            event.status = Some(response.status);

            if response.status == UNAUTHORIZED {
                if attempt >= MAX_ATTEMPTS {
                    self.telemetry
                        .record_auth_error(&event, "unauthorized after credential refresh");
                    return Err(SyncError::AuthenticationExpired);
                }
                self.telemetry.record_auth_error(&event, "unauthorized, refreshing credential");
                credential = Some(self.refreshed_credential(&event).await?);
                attempt += 1;
                continue;
            }

            return self.complete(&event, response);
        }
    }

    /// `send`, then decode the unwrapped data into `T`.
    pub async fn send_as<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, SyncError> {
        let data = self.send(request).await?;
        serde_json::from_value(data).map_err(|e| SyncError::decode(e.to_string()))
    }

    async fn current_credential(&self) -> Option<Credential> {
        match self.identity.get_credential().await {
            Ok(credential) => Some(credential),
            Err(error) => {
                tracing::debug!(%error, "sending without credential");
                None
            }
        }
    }

    async fn refreshed_credential(&self, event: &RequestEvent) -> Result<Credential, SyncError> {
        self.identity.refresh_credential().await.map_err(|error| {
            let error = SyncError::CredentialUnavailable { message: error.message };
            self.telemetry
                .record_request_error(event, error.kind(), &error.to_string());
            error
        })
    }

    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, SyncError> {
        let endpoint = request.url.clone();
        let timeout = self.config.timeout;
        match tokio::time::timeout(timeout, self.executor.execute(request)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(TransportFailure::Timeout)) | Err(_) => Err(SyncError::Timeout { endpoint }),
            Ok(Err(TransportFailure::Unreachable(message))) => {
                Err(SyncError::NetworkUnreachable { message })
            }
        }
    }

    fn complete(&self, event: &RequestEvent, response: HttpResponse) -> Result<Value, SyncError> {
        match self.parse_response(response) {
            Ok(data) => {
                self.telemetry.record_success(event);
                let threshold = self.config.slow_response_threshold;
                if event.duration > threshold {
                    self.telemetry.record_slow_response(event, threshold);
                }
                Ok(data)
            }
            Err(error) => {
                self.telemetry
                    .record_request_error(event, error.kind(), &error.to_string());
                Err(error)
            }
        }
    }
}

fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: String) {
    headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
    headers.push((name.to_ascii_lowercase(), value));
}

fn body_preview(body: &str) -> String {
    let compact = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if compact.chars().count() > BODY_PREVIEW_LIMIT {
        let preview: String = compact.chars().take(BODY_PREVIEW_LIMIT).collect();
        format!("{preview}...")
    } else {
        compact
    }
}
