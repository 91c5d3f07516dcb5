//! Response decoding and error normalization.
//!
//! The backend is not schema-stable about failures: messages may sit under
//! `detail.error.message`, `error.message` or a flat `message`, and
//! validation failures may carry an `error_code`. Each status class has its
//! own decoder that walks the shapes it is known to use, in priority order,
//! and ends at a fixed fallback message.

use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::http::HttpResponse;

pub const VALIDATION_ERROR_CODE: &str = "VALIDATION_ERROR";

const VALIDATION_FALLBACK: &str = "Validation failed";
const AUTH_FALLBACK: &str = "Invalid credentials";
const CONFLICT_FALLBACK: &str = "Email already exists";

/// Technical validation fragments and the text shown instead. First match wins.
const VALIDATION_REWRITES: &[(&str, &str)] = &[
    (
        "value is not a valid email address",
        "Please enter a valid email address",
    ),
    ("@-sign", "Email must contain exactly one @ symbol"),
    ("phone", "Please enter a valid phone number"),
    ("password", "Password does not meet requirements"),
];

/// Turn a response into its JSON payload or a normalized error.
///
/// Any 2xx is success and the body is returned unchanged; an empty body
/// becomes `Value::Null`.
pub fn decode_response(response: HttpResponse) -> Result<Value, ApiError> {
    if !response.is_success() {
        return Err(decode_error(response.status, &response.body));
    }
    if response.body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// Normalize a non-success response. Bodies that are not JSON objects are
/// treated as `{}` so the fallbacks apply.
pub fn decode_error(status: u16, body: &str) -> ApiError {
    let parsed = serde_json::from_str::<Value>(body).unwrap_or(Value::Null);
    let empty = Map::new();
    let body = parsed.as_object().unwrap_or(&empty);

    match status {
        422 => decode_validation(body),
        401 => decode_auth(body),
        409 => decode_conflict(body),
        _ => decode_server(status, body),
    }
}

fn decode_validation(body: &Map<String, Value>) -> ApiError {
    let code = text(body.get("error_code"))
        .or_else(|| text(nested(body, "error").and_then(|e| e.get("code"))))
        .map(str::to_string);
    let message = text(body.get("message"))
        .or_else(|| text(nested(body, "error").and_then(|e| e.get("message"))))
        .unwrap_or(VALIDATION_FALLBACK);

    let message = if code.as_deref() == Some(VALIDATION_ERROR_CODE) {
        rewrite_validation_message(message)
    } else {
        message.to_string()
    };

    ApiError::Validation { code, message }
}

fn decode_auth(body: &Map<String, Value>) -> ApiError {
    let message = detail_error_message(body).unwrap_or(AUTH_FALLBACK).to_string();
    ApiError::Auth { message }
}

fn decode_conflict(body: &Map<String, Value>) -> ApiError {
    let message = text(body.get("message"))
        .or_else(|| text(nested(body, "error").and_then(|e| e.get("message"))))
        .unwrap_or(CONFLICT_FALLBACK)
        .to_string();
    ApiError::Conflict { message }
}

fn decode_server(status: u16, body: &Map<String, Value>) -> ApiError {
    let message = detail_error_message(body)
        .or_else(|| text(body.get("message")))
        .map(str::to_string)
        .unwrap_or_else(|| format!("Server error ({status})"));
    ApiError::Server { status, message }
}

/// Map a technical validation message onto user-facing text, or keep it.
pub fn rewrite_validation_message(message: &str) -> String {
    VALIDATION_REWRITES
        .iter()
        .find(|(needle, _)| message.contains(needle))
        .map(|(_, friendly)| (*friendly).to_string())
        .unwrap_or_else(|| message.to_string())
}

/// `detail.error.message`, where either of `detail` and `error` may be
/// missing and the lookup continues one level up. A level that is set but
/// is not an object holds no message.
fn detail_error_message(body: &Map<String, Value>) -> Option<&str> {
    let detail = descend(body, "detail")?;
    let error = descend(detail, "error")?;
    text(error.get("message"))
}

/// Step into `key` when it is set, stay put when it is unset or falsy.
fn descend<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
    match map.get(key) {
        Some(value) if is_set(value) => value.as_object(),
        _ => Some(map),
    }
}

/// Null, false, zero and the empty string count as unset.
fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn nested<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
    map.get(key).and_then(Value::as_object)
}

/// A non-empty string value.
fn text(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}
