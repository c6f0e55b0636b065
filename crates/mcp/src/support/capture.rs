#![forbid(unsafe_code)]

//! Per-term raw capture artifacts: a pretty-printed JSON array of the raw
//! source records, written atomically.

use super::fsops::atomic_write;
use jw_core::paths::resolve_repo_path;
use jw_core::slug::normalize_text;
use serde_json::Value;
use std::path::PathBuf;

pub(crate) fn build_capture_filename(
    term: &str,
    location: &str,
    hours_old: i64,
    sites: &[String],
) -> String {
    let site = sites
        .first()
        .map(|s| normalize_text(s))
        .unwrap_or_else(|| "unknown".to_string());
    format!(
        "jobspy_{site}_{}_{}_{hours_old}h.json",
        normalize_text(term),
        normalize_text(location)
    )
}

pub(crate) fn write_capture(
    capture_dir: &str,
    filename: &str,
    records: &[Value],
) -> std::io::Result<PathBuf> {
    let path = resolve_repo_path(capture_dir).join(filename);
    let payload = serde_json::to_string_pretty(&Value::Array(records.to_vec()))
        .unwrap_or_else(|_| "[]".to_string());
    atomic_write(&path, payload.as_bytes())?;
    Ok(path)
}
