#![forbid(unsafe_code)]

use jw_core::status::JobStatus;

/// One row of the jobs table as surfaced to readers. Empty strings are
/// normalized to `None` on read.
#[derive(Debug, Clone)]
pub struct JobRow {
    pub id: i64,
    pub job_id: Option<String>,
    pub title: Option<String>,
    pub company: Option<String>,
    pub description: Option<String>,
    pub url: String,
    pub location: Option<String>,
    pub source: Option<String>,
    pub status: String,
    pub captured_at: Option<String>,
}

/// A normalized, filtered scrape record ready for insertion.
#[derive(Debug, Clone)]
pub struct CleanJobRecord {
    pub job_id: String,
    pub title: String,
    pub company: String,
    pub description: String,
    pub url: String,
    pub location: String,
    pub source: String,
    pub captured_at: String,
    pub payload_json: String,
}

#[derive(Debug, Clone, Copy)]
pub struct JobUpdate {
    pub id: i64,
    pub status: JobStatus,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IngestCounts {
    pub inserted: usize,
    pub duplicates: usize,
}

#[derive(Debug)]
pub struct NewJobsPage {
    pub jobs: Vec<JobRow>,
    pub has_more: bool,
    pub next_cursor: Option<String>,
}
