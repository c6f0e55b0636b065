#![forbid(unsafe_code)]

use jw_core::sanitize::sanitize_error_message;
use jw_storage::StoreError;
use serde_json::{Value, json};

fn code_retryable(code: &str) -> bool {
    matches!(code, "DB_ERROR" | "COMPILE_ERROR" | "INTERNAL_ERROR")
}

/// Top-level tool error: `{"error": {code, message, retryable}}`. Every
/// message has already been (or is here) run through the sanitizer.
pub(crate) fn tool_error(code: &str, message: &str) -> Value {
    json!({
        "error": {
            "code": code,
            "message": sanitize_error_message(message),
            "retryable": code_retryable(code),
        }
    })
}

pub(crate) fn validation_error(message: &str) -> Value {
    tool_error("VALIDATION_ERROR", message)
}

pub(crate) fn internal_error(message: &str) -> Value {
    tool_error(
        "INTERNAL_ERROR",
        &format!("Internal error: {}", sanitize_error_message(message)),
    )
}

pub(crate) fn store_error(err: StoreError) -> Value {
    tool_error(err.code(), &err.to_string())
}

pub(crate) fn is_error_payload(payload: &Value) -> bool {
    payload.get("error").is_some()
}
