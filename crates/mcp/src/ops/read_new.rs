#![forbid(unsafe_code)]

//! bulk_read_new_jobs: deterministic paged read of the `new` queue.

use crate::{args_object, ensure_known_keys, optional_i64_in_range, optional_string, store_error};
use jw_storage::{JobRow, JobsStore, PageCursor, decode_cursor, resolve_db_path};
use serde_json::{Value, json};

const ALLOWED_KEYS: [&str; 3] = ["limit", "cursor", "db_path"];
const DEFAULT_LIMIT: i64 = 50;

pub(crate) fn run(args: &Value) -> Value {
    match execute(args) {
        Ok(payload) | Err(payload) => payload,
    }
}

fn execute(args: &Value) -> Result<Value, Value> {
    let args = args_object(args)?;
    ensure_known_keys(args, &ALLOWED_KEYS)?;

    let limit = optional_i64_in_range(args, "limit", 1, 1000)?.unwrap_or(DEFAULT_LIMIT) as usize;
    let cursor_raw = optional_string(args, "cursor")?;
    let db_path_arg = optional_string(args, "db_path")?;

    let cursor: Option<PageCursor> = match cursor_raw {
        Some(raw) => Some(decode_cursor(&raw).map_err(store_error)?),
        None => None,
    };

    let db_path = resolve_db_path(db_path_arg.as_deref());
    let store = JobsStore::open_read(&db_path).map_err(store_error)?;
    let page = store.query_new(limit, cursor.as_ref()).map_err(store_error)?;

    let jobs: Vec<Value> = page.jobs.iter().map(job_row_json).collect();
    Ok(json!({
        "jobs": jobs,
        "count": jobs.len(),
        "has_more": page.has_more,
        "next_cursor": page.next_cursor,
    }))
}

fn job_row_json(row: &JobRow) -> Value {
    json!({
        "id": row.id,
        "job_id": row.job_id,
        "title": row.title,
        "company": row.company,
        "description": row.description,
        "url": row.url,
        "location": row.location,
        "source": row.source,
        "status": row.status,
        "captured_at": row.captured_at,
    })
}
