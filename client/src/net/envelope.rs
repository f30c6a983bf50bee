//! Per-endpoint response adapters.
//!
//! DESIGN
//! ======
//! The backend is inconsistent: some endpoints return a bare body, others wrap
//! the payload as `{"success": bool, "<field>": ...}` and report failures as
//! `{"success": false, "message": "..."}` (or `"error"`). Each endpoint
//! declares its `Shape`, and `adapt` turns any reply into `Result<T, ApiError>`
//! so call sites never branch on the wrapper themselves.

#[cfg(test)]
#[path = "envelope_test.rs"]
mod envelope_test;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::api::ApiError;

const REJECTED_FALLBACK: &str = "request was rejected by the server";

/// How an endpoint wraps its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// The body is the payload.
    Raw,
    /// The body carries `success` and nothing else of interest.
    Flag,
    /// The body carries `success` and the payload under this key.
    Field(&'static str),
    /// The body carries `success` and is itself the payload.
    Flagged,
}

/// Server-supplied explanation, from `message` or `error`.
#[must_use]
pub fn server_message(value: &Value) -> Option<String> {
    ["message", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_owned)
        .filter(|m| !m.trim().is_empty())
}

/// Require `success: true`. A missing flag counts as failure.
///
/// # Errors
///
/// Returns `ApiError::Rejected` carrying the server's message when present.
pub fn ensure_success(value: &Value) -> Result<(), ApiError> {
    if value.get("success").and_then(Value::as_bool) == Some(true) {
        Ok(())
    } else {
        Err(ApiError::Rejected(server_message(value).unwrap_or_else(|| REJECTED_FALLBACK.to_owned())))
    }
}

impl Shape {
    /// Strip the wrapper and return the payload value.
    ///
    /// # Errors
    ///
    /// Returns an error when the envelope reports failure or lacks the field.
    pub fn unwrap(self, value: Value) -> Result<Value, ApiError> {
        match self {
            Self::Raw => Ok(value),
            Self::Flag => ensure_success(&value).map(|()| Value::Null),
            Self::Flagged => ensure_success(&value).map(|()| value),
            Self::Field(key) => {
                ensure_success(&value)?;
                match value {
                    Value::Object(mut map) => map.remove(key).ok_or_else(|| ApiError::MissingField(key.to_owned())),
                    _ => Err(ApiError::MissingField(key.to_owned())),
                }
            }
        }
    }
}

/// Unwrap and decode a reply. `null` payloads decode as `T::default()` so
/// absent sections render as zero/empty instead of failing the refresh.
///
/// # Errors
///
/// Returns an error when unwrapping fails or the payload has the wrong type.
pub fn adapt<T>(shape: Shape, path: &str, value: Value) -> Result<T, ApiError>
where
    T: DeserializeOwned + Default,
{
    let payload = shape.unwrap(value)?;
    if payload.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(payload).map_err(|e| ApiError::Decode { path: path.to_owned(), message: e.to_string() })
}
