#![forbid(unsafe_code)]

//! bulk_update_job_status: atomic all-or-nothing batched status mutation.
//!
//! Request-level failures (shape, batch size, duplicate ids) surface as the
//! top-level error object. Per-item validation failures abort the batch
//! before any write; results keep one entry per input item, offenders with
//! their specific error and the rest marked batch-aborted.

use crate::{
    args_object, ensure_known_keys, id_dedupe_key, optional_string, require_items, store_error,
    validation_error,
};
use crate::support::now_iso_ms;
use jw_core::status::JobStatus;
use jw_storage::{JobUpdate, JobsStore, resolve_db_path};
use serde_json::{Value, json};
use std::collections::HashSet;

const ALLOWED_KEYS: [&str; 2] = ["updates", "db_path"];
const ITEM_KEYS: [&str; 2] = ["id", "status"];
const MAX_BATCH: usize = 100;

pub(crate) fn run(args: &Value) -> Value {
    match execute(args) {
        Ok(payload) | Err(payload) => payload,
    }
}

fn execute(args: &Value) -> Result<Value, Value> {
    let args = args_object(args)?;
    ensure_known_keys(args, &ALLOWED_KEYS)?;
    let updates = require_items(args, "updates", MAX_BATCH)?;
    let db_path_arg = optional_string(args, "db_path")?;

    if updates.is_empty() {
        return Ok(json!({
            "updated_count": 0,
            "failed_count": 0,
            "results": [],
        }));
    }

    // Duplicate detection is string-keyed so mixed-type duplicates (1 and
    // "1") are caught here instead of degrading later.
    let mut seen: HashSet<String> = HashSet::new();
    for item in &updates {
        let raw_id = item.get("id").cloned().unwrap_or(Value::Null);
        if !seen.insert(id_dedupe_key(&raw_id)) {
            return Err(validation_error(
                "Duplicate job IDs are not allowed in one batch",
            ));
        }
    }

    let mut parsed: Vec<JobUpdate> = Vec::with_capacity(updates.len());
    let mut item_errors: Vec<Option<String>> = Vec::with_capacity(updates.len());
    for item in &updates {
        match validate_item(item) {
            Ok(update) => {
                parsed.push(update);
                item_errors.push(None);
            }
            Err(message) => item_errors.push(Some(message)),
        }
    }
    if item_errors.iter().any(Option::is_some) {
        return Ok(aborted_response(&updates, &item_errors));
    }

    let db_path = resolve_db_path(db_path_arg.as_deref());
    let mut store = JobsStore::open_write(&db_path).map_err(store_error)?;
    store.ensure_update_columns().map_err(store_error)?;

    let ids: Vec<i64> = parsed.iter().map(|u| u.id).collect();
    let missing = store.missing_ids(&ids).map_err(store_error)?;
    if !missing.is_empty() {
        let item_errors: Vec<Option<String>> = parsed
            .iter()
            .map(|u| {
                missing
                    .contains(&u.id)
                    .then(|| format!("Job id {} does not exist", u.id))
            })
            .collect();
        return Ok(aborted_response(&updates, &item_errors));
    }

    let now = now_iso_ms();
    store.bulk_update_status(&parsed, &now).map_err(store_error)?;

    let results: Vec<Value> = parsed
        .iter()
        .map(|u| json!({ "id": u.id, "success": true }))
        .collect();
    Ok(json!({
        "updated_count": parsed.len(),
        "failed_count": 0,
        "results": results,
    }))
}

/// All-or-nothing abort: one result per input item in input order, nothing
/// written. Offenders carry their own error; the rest are batch-aborted.
fn aborted_response(updates: &[Value], item_errors: &[Option<String>]) -> Value {
    let results: Vec<Value> = updates
        .iter()
        .zip(item_errors)
        .map(|(item, error)| {
            json!({
                "id": item.get("id").cloned().unwrap_or(Value::Null),
                "success": false,
                "error": error
                    .as_deref()
                    .unwrap_or("Batch aborted: no updates were applied"),
            })
        })
        .collect();
    json!({
        "updated_count": 0,
        "failed_count": results.len(),
        "results": results,
    })
}

fn validate_item(item: &Value) -> Result<JobUpdate, String> {
    let Some(obj) = item.as_object() else {
        return Err("update item must be an object with id and status".to_string());
    };
    for key in obj.keys() {
        if !ITEM_KEYS.contains(&key.as_str()) {
            return Err(format!("unknown field '{key}' in update item"));
        }
    }

    let id = match obj.get("id") {
        None => return Err("update item is missing required field 'id'".to_string()),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(id) if id > 0 => id,
            _ => return Err("invalid job id: must be a positive integer".to_string()),
        },
        Some(_) => return Err("invalid job id: must be a positive integer".to_string()),
    };

    let status = match obj.get("status") {
        None => return Err("update item is missing required field 'status'".to_string()),
        Some(Value::String(raw)) => {
            if raw.trim() != raw {
                return Err(
                    "invalid status: leading or trailing whitespace is not allowed".to_string(),
                );
            }
            match JobStatus::parse(raw) {
                Some(status) => status,
                None => {
                    return Err(format!(
                        "invalid status '{raw}': must be one of {}",
                        JobStatus::allowed_values()
                    ));
                }
            }
        }
        Some(_) => return Err("invalid status: must be a string".to_string()),
    };

    Ok(JobUpdate { id, status })
}
