//! Error types for the library sync layer.
//!
//! # Design
//! Every failure a caller can observe is one `SyncError` variant, so the UI
//! can choose a message and a recovery action (retry, redirect to login,
//! give up) by matching on the kind alone. `NotFound` keeps its own variant
//! because callers routinely branch on "the entity is gone" versus "the
//! server refused."
//!
//! Unknown server tags and orphaned sublocations are not errors: adapters
//! recover from them locally and report them as `AdapterNotice`s.

use thiserror::Error;

/// Errors returned by `ApiClient` and `LibraryApi`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// The request exceeded the configured timeout.
    #[error("request to {endpoint} timed out")]
    Timeout { endpoint: String },

    /// The server could not be reached or the connection failed mid-flight.
    #[error("network unreachable: {message}")]
    NetworkUnreachable { message: String },

    /// The response was not a well-formed envelope.
    #[error("protocol violation: {message}")]
    ProtocolViolation { message: String },

    /// The envelope reported `success: false`.
    #[error("server reported failure: {message}")]
    RemoteReportedFailure { message: String },

    /// A `401` survived the single credential refresh.
    #[error("authentication expired")]
    AuthenticationExpired,

    /// The identity provider could not supply or refresh a credential.
    #[error("credential unavailable: {message}")]
    CredentialUnavailable { message: String },

    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// Any other terminal non-2xx status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The request could not be encoded (body or path segment).
    #[error("serialization failed: {message}")]
    Serialization { message: String },

    /// Unwrapped `data` did not match the expected entity shape.
    #[error("decode failed: {message}")]
    Decode { message: String },
}

impl SyncError {
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::ProtocolViolation { message: message.into() }
    }

    pub fn remote(message: impl Into<String>) -> Self {
        Self::RemoteReportedFailure { message: message.into() }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode { message: message.into() }
    }

    /// Whether repeating the same request later may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::NetworkUnreachable { .. } => true,
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Whether the caller should send the user back through sign-in.
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            Self::AuthenticationExpired | Self::CredentialUnavailable { .. }
        )
    }

    /// Short stable label used as a telemetry field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::NetworkUnreachable { .. } => "network_unreachable",
            Self::ProtocolViolation { .. } => "protocol_violation",
            Self::RemoteReportedFailure { .. } => "remote_reported_failure",
            Self::AuthenticationExpired => "authentication_expired",
            Self::CredentialUnavailable { .. } => "credential_unavailable",
            Self::NotFound => "not_found",
            Self::Status { .. } => "status",
            Self::Serialization { .. } => "serialization",
            Self::Decode { .. } => "decode",
        }
    }
}
