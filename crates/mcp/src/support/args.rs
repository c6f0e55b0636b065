#![forbid(unsafe_code)]

//! Argument extraction over the raw tool-call args map.
//!
//! Every helper returns `Result<T, Value>` where the error is a ready-to-
//! return tool error payload; handlers use `?` and stay linear. The closed
//! key set is enforced up front so unknown request properties fail at
//! decode time.

use crate::validation_error;
use serde_json::{Map, Value};

pub(crate) fn args_object(args: &Value) -> Result<&Map<String, Value>, Value> {
    args.as_object()
        .ok_or_else(|| validation_error("arguments must be an object"))
}

pub(crate) fn ensure_known_keys(
    args: &Map<String, Value>,
    allowed: &[&str],
) -> Result<(), Value> {
    for key in args.keys() {
        if !allowed.contains(&key.as_str()) {
            return Err(validation_error(&format!("Unknown parameter: {key}")));
        }
    }
    Ok(())
}

pub(crate) fn require_string(args: &Map<String, Value>, key: &str) -> Result<String, Value> {
    match args.get(key) {
        Some(Value::String(v)) => Ok(v.to_string()),
        Some(_) => Err(validation_error(&format!("{key} must be a string"))),
        None => Err(validation_error(&format!("{key} is required"))),
    }
}

pub(crate) fn require_nonempty_string(
    args: &Map<String, Value>,
    key: &str,
) -> Result<String, Value> {
    let value = require_string(args, key)?;
    if value.trim().is_empty() {
        return Err(validation_error(&format!("{key} must not be empty")));
    }
    Ok(value)
}

pub(crate) fn optional_string(
    args: &Map<String, Value>,
    key: &str,
) -> Result<Option<String>, Value> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(v)) => Ok(Some(v.to_string())),
        Some(_) => Err(validation_error(&format!("{key} must be a string"))),
    }
}

pub(crate) fn optional_bool(args: &Map<String, Value>, key: &str) -> Result<Option<bool>, Value> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(v)) => Ok(Some(*v)),
        Some(_) => Err(validation_error(&format!("{key} must be a boolean"))),
    }
}

pub(crate) fn optional_i64_in_range(
    args: &Map<String, Value>,
    key: &str,
    min: i64,
    max: i64,
) -> Result<Option<i64>, Value> {
    let value = match args.get(key) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) if n.as_i64().is_some() => n.as_i64().unwrap_or_default(),
        Some(_) => {
            return Err(validation_error(&format!(
                "{key} must be an integer between {min} and {max}"
            )));
        }
    };
    if value < min || value > max {
        return Err(validation_error(&format!(
            "{key} must be an integer between {min} and {max}"
        )));
    }
    Ok(Some(value))
}

pub(crate) fn optional_f64_in_range(
    args: &Map<String, Value>,
    key: &str,
    min: f64,
    max: f64,
) -> Result<Option<f64>, Value> {
    let value = match args.get(key) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(_) => {
            return Err(validation_error(&format!(
                "{key} must be a number between {min} and {max}"
            )));
        }
    };
    if !value.is_finite() || value < min || value > max {
        return Err(validation_error(&format!(
            "{key} must be a number between {min} and {max}"
        )));
    }
    Ok(Some(value))
}

pub(crate) fn optional_string_list(
    args: &Map<String, Value>,
    key: &str,
) -> Result<Option<Vec<String>>, Value> {
    let items = match args.get(key) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(validation_error(&format!(
                "{key} must be a non-empty array of strings"
            )));
        }
    };
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::String(v) if !v.trim().is_empty() => out.push(v.to_string()),
            _ => {
                return Err(validation_error(&format!(
                    "{key} must be a non-empty array of strings"
                )));
            }
        }
    }
    if out.is_empty() {
        return Err(validation_error(&format!(
            "{key} must be a non-empty array of strings"
        )));
    }
    Ok(Some(out))
}

/// Batch payload: an array of at most `max` items. The empty batch is the
/// caller's decision to allow or reject.
pub(crate) fn require_items(
    args: &Map<String, Value>,
    key: &str,
    max: usize,
) -> Result<Vec<Value>, Value> {
    let items = match args.get(key) {
        Some(Value::Array(items)) => items,
        Some(_) => return Err(validation_error(&format!("{key} must be a list"))),
        None => return Err(validation_error(&format!("{key} is required"))),
    };
    if items.len() > max {
        return Err(validation_error(&format!(
            "{key} batch size exceeds the maximum of {max} items"
        )));
    }
    Ok(items.clone())
}

/// String-keyed id rendering so duplicate detection treats `1` and `"1"` as
/// the same id instead of degrading to an internal error on mixed types.
pub(crate) fn id_dedupe_key(raw: &Value) -> String {
    match raw {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
