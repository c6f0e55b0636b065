#![forbid(unsafe_code)]

//! finalize_resume_batch, phase B of the two-phase finalize: validate
//! artifacts, commit DB audit fields, then synchronize the tracker
//! projection. The DB commits first; when the tracker write then fails,
//! compensation falls the row back to `reviewed` with a recorded error.

use crate::support::{
    check_resume_artifacts, generate_run_id, now_iso_ms, parse_tracker, resume_tex_from_pdf,
    update_tracker_status_file,
};
use crate::{
    args_object, ensure_known_keys, id_dedupe_key, optional_bool, optional_string, require_items,
    store_error, validation_error,
};
use jw_core::paths::resolve_repo_path;
use jw_core::sanitize::sanitize_error_message;
use jw_storage::{JobsStore, resolve_db_path};
use serde_json::{Value, json};
use std::collections::HashSet;
use std::path::PathBuf;

const ALLOWED_KEYS: [&str; 4] = ["items", "run_id", "db_path", "dry_run"];
const ITEM_KEYS: [&str; 3] = ["id", "tracker_path", "resume_pdf_path"];
const MAX_BATCH: usize = 100;

pub(crate) fn run(args: &Value) -> Value {
    match execute(args) {
        Ok(payload) | Err(payload) => payload,
    }
}

fn execute(args: &Value) -> Result<Value, Value> {
    let args = args_object(args)?;
    ensure_known_keys(args, &ALLOWED_KEYS)?;

    let items = require_items(args, "items", MAX_BATCH)?;
    let run_id = match optional_string(args, "run_id")? {
        Some(raw) => {
            if raw.trim().is_empty() {
                return Err(validation_error("run_id must not be empty"));
            }
            raw
        }
        None => generate_run_id("run"),
    };
    let dry_run = optional_bool(args, "dry_run")?.unwrap_or(false);
    let db_path_arg = optional_string(args, "db_path")?;

    if items.is_empty() {
        return Ok(json!({
            "run_id": run_id,
            "finalized_count": 0,
            "failed_count": 0,
            "dry_run": dry_run,
            "results": [],
        }));
    }

    let mut seen: HashSet<String> = HashSet::new();
    for item in &items {
        let raw_id = item.get("id").cloned().unwrap_or(Value::Null);
        if !seen.insert(id_dedupe_key(&raw_id)) {
            return Err(validation_error(
                "Duplicate job IDs are not allowed in one batch",
            ));
        }
    }

    let db_path = resolve_db_path(db_path_arg.as_deref());
    let mut store = JobsStore::open_write(&db_path).map_err(store_error)?;
    store.ensure_finalize_columns().map_err(store_error)?;

    let mut results: Vec<Value> = Vec::with_capacity(items.len());
    for item in &items {
        results.push(process_item(item, &mut store, &run_id, dry_run));
    }

    let finalized_count = results.iter().filter(|r| r["success"] == true).count();
    let failed_count = results.len() - finalized_count;

    Ok(json!({
        "run_id": run_id,
        "finalized_count": finalized_count,
        "failed_count": failed_count,
        "dry_run": dry_run,
        "results": results,
    }))
}

struct ItemPlan {
    id: i64,
    tracker_path: String,
    tracker_file: PathBuf,
    resume_pdf_path: String,
}

fn process_item(item: &Value, store: &mut JobsStore, run_id: &str, dry_run: bool) -> Value {
    let plan = match plan_item(item) {
        Ok(plan) => plan,
        Err(message) => {
            return failed_result(
                item.get("id").cloned().unwrap_or(Value::Null),
                item.get("tracker_path").cloned().unwrap_or(Value::Null),
                None,
                dry_run,
                &message,
            );
        }
    };

    if dry_run {
        return json!({
            "id": plan.id,
            "tracker_path": plan.tracker_path,
            "resume_pdf_path": plan.resume_pdf_path,
            "action": "would_finalize",
            "success": true,
        });
    }

    // Commit order is load-bearing: DB first, then the tracker projection.
    if let Err(err) = store.finalize_resume_written(
        plan.id,
        &plan.resume_pdf_path,
        run_id,
        &now_iso_ms(),
    ) {
        let message = format!(
            "DB finalization failed: {}",
            sanitize_error_message(&err.to_string())
        );
        return failed_result(
            json!(plan.id),
            json!(plan.tracker_path),
            Some(plan.resume_pdf_path.as_str()),
            dry_run,
            &message,
        );
    }

    match update_tracker_status_file(&plan.tracker_file, "Resume Written") {
        Ok(()) => json!({
            "id": plan.id,
            "tracker_path": plan.tracker_path,
            "resume_pdf_path": plan.resume_pdf_path,
            "action": "finalized",
            "success": true,
        }),
        Err(tracker_err) => {
            // Compensation: the DB committed but the projection did not.
            let message = format!(
                "Tracker sync failed: {}",
                sanitize_error_message(tracker_err.message())
            );
            let message = match store.fallback_to_reviewed(plan.id, &message, &now_iso_ms()) {
                Ok(()) => message,
                Err(fallback_err) => format!(
                    "{message}; Fallback also failed: {}",
                    sanitize_error_message(&fallback_err.to_string())
                ),
            };
            failed_result(
                json!(plan.id),
                json!(plan.tracker_path),
                Some(plan.resume_pdf_path.as_str()),
                dry_run,
                &message,
            )
        }
    }
}

fn plan_item(item: &Value) -> Result<ItemPlan, String> {
    let Some(obj) = item.as_object() else {
        return Err("item must be an object with id and tracker_path".to_string());
    };
    for key in obj.keys() {
        if !ITEM_KEYS.contains(&key.as_str()) {
            return Err(format!("unknown field '{key}' in item"));
        }
    }

    let id = match obj.get("id") {
        Some(Value::Number(n)) => match n.as_i64() {
            Some(id) if id > 0 => id,
            _ => return Err("item id must be a positive integer".to_string()),
        },
        Some(_) => return Err("item id must be a positive integer".to_string()),
        None => return Err("item is missing required field 'id'".to_string()),
    };
    let tracker_path = match obj.get("tracker_path") {
        Some(Value::String(path)) if !path.trim().is_empty() => path.to_string(),
        _ => return Err("item requires a non-empty tracker_path".to_string()),
    };
    let override_pdf = match obj.get("resume_pdf_path") {
        None | Some(Value::Null) => None,
        Some(Value::String(path)) if !path.trim().is_empty() => Some(path.to_string()),
        Some(_) => return Err("item resume_pdf_path must be a non-empty string".to_string()),
    };

    let tracker_file = resolve_repo_path(&tracker_path);
    if !tracker_file.is_file() {
        return Err(format!("Tracker file not found: {tracker_path}"));
    }

    // Item override wins; otherwise the tracker's own resume_path decides.
    let resume_pdf_path = match override_pdf {
        Some(path) => path,
        None => {
            let doc = parse_tracker(&tracker_file).map_err(|err| {
                format!(
                    "Failed to resolve resume_pdf_path: {}",
                    sanitize_error_message(err.message())
                )
            })?;
            let raw = doc.field_str("resume_path").ok_or_else(|| {
                "Failed to resolve resume_pdf_path: Tracker frontmatter is missing \
                 'resume_path' field"
                    .to_string()
            })?;
            jw_core::slug::strip_wiki_link(raw).to_string()
        }
    };

    let pdf = resolve_repo_path(&resume_pdf_path);
    let tex = resume_tex_from_pdf(&pdf);
    check_resume_artifacts(&pdf, &tex)?;

    Ok(ItemPlan {
        id,
        tracker_path,
        tracker_file,
        resume_pdf_path,
    })
}

fn failed_result(
    id: Value,
    tracker_path: Value,
    resume_pdf_path: Option<&str>,
    dry_run: bool,
    message: &str,
) -> Value {
    json!({
        "id": id,
        "tracker_path": tracker_path,
        "resume_pdf_path": resume_pdf_path,
        "action": if dry_run { "would_fail" } else { "failed" },
        "success": false,
        "error": message,
    })
}
