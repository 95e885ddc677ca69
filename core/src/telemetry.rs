//! Fire-and-forget observability sink.
//!
//! The transport reports request lifecycle events and the API layer forwards
//! adapter notices here. Sinks are synchronous and infallible: a sink that
//! needs I/O must buffer internally and never block the caller.

use std::time::Duration;

use crate::adapters::AdapterNotice;
use crate::http::HttpMethod;

/// Identifies the request an event belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestEvent {
    pub method: HttpMethod,
    pub endpoint: String,
    /// `None` when no response was received.
    pub status: Option<u16>,
    pub duration: Duration,
    /// 1 for the first send, 2 for the post-refresh resend.
    pub attempt: u8,
}

/// External observability collaborator.
pub trait TelemetrySink: Send + Sync {
    fn record_breadcrumb(&self, category: &str, message: &str);
    fn record_success(&self, event: &RequestEvent);
    fn record_slow_response(&self, event: &RequestEvent, threshold: Duration);
    fn record_request_error(&self, event: &RequestEvent, kind: &str, message: &str);
    fn record_auth_error(&self, event: &RequestEvent, message: &str);

    /// Adapter substituted a default or dropped a record.
    fn record_adapter_notice(&self, notice: &AdapterNotice) {
        self.record_breadcrumb("adapter", &notice.to_string());
    }
}

/// Emits every event as a `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTelemetry;

impl TelemetrySink for TracingTelemetry {
    fn record_breadcrumb(&self, category: &str, message: &str) {
        tracing::debug!(category, message, "breadcrumb");
    }

    fn record_success(&self, event: &RequestEvent) {
        tracing::debug!(
            method = %event.method,
            endpoint = %event.endpoint,
            status = event.status,
            duration_ms = duration_ms(event.duration),
            attempt = event.attempt,
            "request succeeded"
        );
    }

    fn record_slow_response(&self, event: &RequestEvent, threshold: Duration) {
        tracing::warn!(
            method = %event.method,
            endpoint = %event.endpoint,
            duration_ms = duration_ms(event.duration),
            threshold_ms = duration_ms(threshold),
            "slow response"
        );
    }

    fn record_request_error(&self, event: &RequestEvent, kind: &str, message: &str) {
        tracing::warn!(
            method = %event.method,
            endpoint = %event.endpoint,
            status = event.status,
            duration_ms = duration_ms(event.duration),
            attempt = event.attempt,
            kind,
            message,
            "request failed"
        );
    }

    fn record_auth_error(&self, event: &RequestEvent, message: &str) {
        tracing::warn!(
            method = %event.method,
            endpoint = %event.endpoint,
            attempt = event.attempt,
            message,
            "authorization failed"
        );
    }

    fn record_adapter_notice(&self, notice: &AdapterNotice) {
        tracing::warn!(notice = %notice, "adapter recovered from unexpected data");
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTelemetry;

impl TelemetrySink for NoopTelemetry {
    fn record_breadcrumb(&self, _category: &str, _message: &str) {}
    fn record_success(&self, _event: &RequestEvent) {}
    fn record_slow_response(&self, _event: &RequestEvent, _threshold: Duration) {}
    fn record_request_error(&self, _event: &RequestEvent, _kind: &str, _message: &str) {}
    fn record_auth_error(&self, _event: &RequestEvent, _message: &str) {}
    fn record_adapter_notice(&self, _notice: &AdapterNotice) {}
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
