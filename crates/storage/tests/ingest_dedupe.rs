#![forbid(unsafe_code)]

use jw_core::status::JobStatus;
use jw_storage::{CleanJobRecord, JobsStore};
use rusqlite::Connection;
use std::path::PathBuf;

fn temp_db(test_name: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = base.join(format!("jw_storage_{test_name}_{pid}_{nonce}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir.join("jobs.db")
}

fn record(url: &str, title: &str) -> CleanJobRecord {
    CleanJobRecord {
        job_id: "123".to_string(),
        title: title.to_string(),
        company: "TestCo".to_string(),
        description: "desc".to_string(),
        url: url.to_string(),
        location: "Remote".to_string(),
        source: "linkedin".to_string(),
        captured_at: "2026-02-01T08:00:00.000Z".to_string(),
        payload_json: "{}".to_string(),
    }
}

#[test]
fn reingest_reports_duplicates_and_keeps_row_count() {
    let db_path = temp_db("reingest_reports_duplicates_and_keeps_row_count");
    let records: Vec<_> = (1..=3)
        .map(|i| record(&format!("https://example.com/job/{i}"), "Engineer"))
        .collect();

    let mut store = JobsStore::open_or_create(&db_path).expect("open");
    let first = store
        .insert_cleaned(&records, JobStatus::New, "2026-02-01T08:00:00.000Z")
        .expect("first ingest");
    assert_eq!(first.inserted, 3);
    assert_eq!(first.duplicates, 0);

    let second = store
        .insert_cleaned(&records, JobStatus::New, "2026-02-01T09:00:00.000Z")
        .expect("second ingest");
    assert_eq!(second.inserted, 0);
    assert_eq!(second.duplicates, 3);

    let third = store
        .insert_cleaned(&records, JobStatus::New, "2026-02-01T10:00:00.000Z")
        .expect("third ingest");
    assert_eq!(third.inserted, 0);
    assert_eq!(third.duplicates, 3);

    drop(store);
    let conn = Connection::open(&db_path).expect("open raw");
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM jobs", [], |row| row.get(0))
        .expect("count");
    assert_eq!(count, 3);
}

#[test]
fn dedupe_hit_never_mutates_the_existing_row() {
    let db_path = temp_db("dedupe_hit_never_mutates_the_existing_row");
    let url = "https://example.com/job/1";

    let mut store = JobsStore::open_or_create(&db_path).expect("open");
    store
        .insert_cleaned(
            &[record(url, "Original Title")],
            JobStatus::New,
            "2026-02-01T08:00:00.000Z",
        )
        .expect("first ingest");

    let before: Vec<(String, String, String, String)> = {
        let conn = Connection::open(&db_path).expect("open raw");
        let row = conn
            .query_row(
                "SELECT title, status, created_at, updated_at FROM jobs WHERE url = ?1",
                [url],
                |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
                },
            )
            .expect("before row");
        vec![row]
    };

    // Same URL, different field values and a different target status.
    let counts = store
        .insert_cleaned(
            &[record(url, "Replaced Title")],
            JobStatus::Shortlist,
            "2026-02-02T08:00:00.000Z",
        )
        .expect("second ingest");
    assert_eq!(counts.inserted, 0);
    assert_eq!(counts.duplicates, 1);

    let conn = Connection::open(&db_path).expect("open raw");
    let after = conn
        .query_row(
            "SELECT title, status, created_at, updated_at FROM jobs WHERE url = ?1",
            [url],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .expect("after row");
    assert_eq!(before[0], after);
}

#[test]
fn bootstrap_is_idempotent() {
    let db_path = temp_db("bootstrap_is_idempotent");
    let store = JobsStore::open_or_create(&db_path).expect("first open");
    drop(store);
    let store = JobsStore::open_or_create(&db_path).expect("second open");
    drop(store);

    let conn = Connection::open(&db_path).expect("open raw");
    let index_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='index' AND name='idx_jobs_status'",
            [],
            |row| row.get(0),
        )
        .expect("index lookup");
    assert_eq!(index_count, 1);
}
