#![forbid(unsafe_code)]

//! initialize_shortlist_trackers: project shortlisted rows into tracker
//! markdown files. Read-only against the database; per-item failures are
//! isolated and the batch continues.

use crate::support::{
    DEFAULT_APPLICATIONS_DIR, date_part, ensure_workspace_dirs, find_tracker_by_reference,
    render_tracker, today_ymd,
};
use crate::{
    args_object, atomic_write, ensure_known_keys, optional_bool, optional_i64_in_range,
    optional_string, store_error,
};
use jw_core::paths::resolve_repo_path;
use jw_core::sanitize::sanitize_error_message;
use jw_core::slug::normalize_text;
use jw_storage::{JobRow, JobsStore, resolve_db_path};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};

const ALLOWED_KEYS: [&str; 6] = [
    "limit",
    "db_path",
    "trackers_dir",
    "applications_dir",
    "force",
    "dry_run",
];
const DEFAULT_LIMIT: i64 = 50;
const DEFAULT_TRACKERS_DIR: &str = "trackers";

pub(crate) fn run(args: &Value) -> Value {
    match execute(args) {
        Ok(payload) | Err(payload) => payload,
    }
}

fn execute(args: &Value) -> Result<Value, Value> {
    let args = args_object(args)?;
    ensure_known_keys(args, &ALLOWED_KEYS)?;

    let limit = optional_i64_in_range(args, "limit", 1, 200)?.unwrap_or(DEFAULT_LIMIT) as usize;
    let trackers_dir = optional_string(args, "trackers_dir")?
        .unwrap_or_else(|| DEFAULT_TRACKERS_DIR.to_string());
    let applications_dir = optional_string(args, "applications_dir")?
        .unwrap_or_else(|| DEFAULT_APPLICATIONS_DIR.to_string());
    let force = optional_bool(args, "force")?.unwrap_or(false);
    let dry_run = optional_bool(args, "dry_run")?.unwrap_or(false);
    let db_path = resolve_db_path(optional_string(args, "db_path")?.as_deref());

    // Anchored to the workflow root, never the per-call CWD.
    let trackers_root = resolve_repo_path(&trackers_dir);

    let store = JobsStore::open_read(&db_path).map_err(store_error)?;
    let jobs = store.query_shortlist(limit).map_err(store_error)?;

    let mut results: Vec<Value> = Vec::with_capacity(jobs.len());
    for job in &jobs {
        let mut planned_path: Option<PathBuf> = None;
        match project_job(
            job,
            &trackers_root,
            &applications_dir,
            force,
            dry_run,
            &mut planned_path,
        ) {
            Ok((path, action)) => results.push(json!({
                "id": job.id,
                "job_id": job.job_id,
                "tracker_path": path.to_string_lossy(),
                "action": action,
                "success": true,
            })),
            Err(err) => {
                let mut item = serde_json::Map::new();
                item.insert("id".to_string(), json!(job.id));
                item.insert("job_id".to_string(), json!(job.job_id));
                if let Some(path) = planned_path {
                    item.insert("tracker_path".to_string(), json!(path.to_string_lossy()));
                }
                item.insert("action".to_string(), json!("failed"));
                item.insert("success".to_string(), json!(false));
                item.insert("error".to_string(), json!(sanitize_error_message(&err)));
                results.push(Value::Object(item));
            }
        }
    }

    let created = results
        .iter()
        .filter(|r| matches!(r["action"].as_str(), Some("created") | Some("overwritten")))
        .count();
    let skipped = results
        .iter()
        .filter(|r| r["action"] == "skipped_exists")
        .count();
    let failed = results.iter().filter(|r| r["action"] == "failed").count();

    Ok(json!({
        "created_count": created,
        "skipped_count": skipped,
        "failed_count": failed,
        "results": results,
    }))
}

fn project_job(
    job: &JobRow,
    trackers_root: &Path,
    applications_dir: &str,
    force: bool,
    dry_run: bool,
    planned_path: &mut Option<PathBuf>,
) -> Result<(PathBuf, &'static str), String> {
    let company = job.company.as_deref().unwrap_or("");
    let company_slug = normalize_text(company);
    let date = job
        .captured_at
        .as_deref()
        .and_then(date_part)
        .map(str::to_string)
        .unwrap_or_else(today_ymd);

    let deterministic_path = trackers_root.join(format!("{date}-{company_slug}-{}.md", job.id));
    *planned_path = Some(deterministic_path.clone());

    // Legacy-reference dedupe: a pre-existing tracker for the same job URL
    // counts as this job's tracker even under a different filename.
    let (path, exists) = if deterministic_path.is_file() {
        (deterministic_path, true)
    } else if let Some(legacy) = find_tracker_by_reference(trackers_root, &job.url) {
        (legacy, true)
    } else {
        (deterministic_path, false)
    };
    *planned_path = Some(path.clone());

    let action = match (exists, force) {
        (false, _) => "created",
        (true, false) => "skipped_exists",
        (true, true) => "overwritten",
    };
    if action == "skipped_exists" {
        return Ok((path, action));
    }

    if !dry_run {
        let application_slug = format!("{company_slug}-{}", job.id);
        ensure_workspace_dirs(applications_dir, &application_slug)
            .map_err(|err| format!("Failed to create workspace directories: {err}"))?;
        let content = render_tracker(job, &application_slug, &date);
        atomic_write(&path, content.as_bytes())
            .map_err(|err| format!("Failed to write tracker: {err}"))?;
    }

    Ok((path, action))
}
