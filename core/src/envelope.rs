//! Validation and unwrapping of the `{ success, data, error }` response envelope.
//!
//! The envelope keys are the only keys whose casing is fixed, so validation
//! runs on the raw wire payload and only the unwrapped `data` is handed on to
//! the case transcoder.

use serde_json::Value;

use crate::error::SyncError;

/// Unwrap `data` from a decoded envelope.
///
/// Checks, in order: the payload is an object; `success` is a boolean;
/// `success: false` yields `RemoteReportedFailure` when it carries a string
/// `error` and `ProtocolViolation` otherwise; `success: true` requires `data`
/// to be an object or an array.
pub fn unwrap_envelope(payload: Value) -> Result<Value, SyncError> {
    let Value::Object(mut fields) = payload else {
        return Err(SyncError::protocol("response body is not an object"));
    };

    let success = match fields.get("success") {
        Some(Value::Bool(flag)) => *flag,
        Some(_) => return Err(SyncError::protocol("`success` is not a boolean")),
        None => return Err(SyncError::protocol("missing `success`")),
    };

    if !success {
        return match error_message(&fields) {
            Some(message) => Err(SyncError::remote(message)),
            None => Err(SyncError::protocol("missing error")),
        };
    }

    match fields.remove("data") {
        Some(data @ (Value::Object(_) | Value::Array(_))) => Ok(data),
        _ => Err(SyncError::protocol("missing data")),
    }
}

/// Decode a body string and unwrap its envelope.
pub fn unwrap_envelope_str(body: &str) -> Result<Value, SyncError> {
    let payload: Value = serde_json::from_str(body)
        .map_err(|e| SyncError::protocol(format!("response body is not JSON: {e}")))?;
    unwrap_envelope(payload)
}

/// Best-effort extraction of the `error` string from a failed reply body.
///
/// Used for non-2xx responses whose body may or may not be an envelope.
pub fn failure_message(body: &str) -> Option<String> {
    let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(body) else {
        return None;
    };
    error_message(&fields).map(str::to_owned)
}

fn error_message(fields: &serde_json::Map<String, Value>) -> Option<&str> {
    fields.get("error").and_then(Value::as_str)
}
