#![forbid(unsafe_code)]

mod cursor;
mod error;
mod ingest;
mod reader;
mod types;
mod writer;

pub use cursor::{PageCursor, decode_cursor, encode_cursor};
pub use error::StoreError;
pub use types::{CleanJobRecord, IngestCounts, JobRow, JobUpdate, NewJobsPage};

use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_DB_RELATIVE: &str = "data/capture/jobs.db";
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolves the jobs database path: explicit argument, then the
/// `JOBWORKFLOW_DB` override, then `<root>/data/capture/jobs.db`.
pub fn resolve_db_path(explicit: Option<&str>) -> PathBuf {
    if let Some(raw) = explicit {
        return jw_core::paths::resolve_repo_path(raw);
    }
    if let Some(raw) = std::env::var_os("JOBWORKFLOW_DB")
        && !raw.is_empty()
    {
        return PathBuf::from(raw);
    }
    jw_core::paths::workflow_root().join(DEFAULT_DB_RELATIVE)
}

/// One scoped connection to the jobs database. Writers hold it mutably;
/// transactions roll back on drop unless committed.
#[derive(Debug)]
pub struct JobsStore {
    conn: Connection,
}

impl JobsStore {
    /// Read-only scope. The database file must already exist.
    pub fn open_read(db_path: &Path) -> Result<Self, StoreError> {
        if !db_path.is_file() {
            return Err(StoreError::DbNotFound(db_path.to_path_buf()));
        }
        let conn = Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(Self { conn })
    }

    /// Read-write scope. The database file must already exist.
    pub fn open_write(db_path: &Path) -> Result<Self, StoreError> {
        if !db_path.is_file() {
            return Err(StoreError::DbNotFound(db_path.to_path_buf()));
        }
        let conn = Connection::open(db_path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(Self { conn })
    }

    /// Ingest scope: creates the database file, the jobs table, and the
    /// status index when missing. Bootstrap is idempotent.
    pub fn open_or_create(db_path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        install_schema(&conn)?;
        Ok(Self { conn })
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}

fn install_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS jobs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            job_id TEXT,
            title TEXT,
            company TEXT,
            description TEXT,
            url TEXT UNIQUE NOT NULL,
            location TEXT,
            source TEXT,
            status TEXT NOT NULL DEFAULT 'new',
            captured_at TEXT,
            payload_json TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT,
            resume_pdf_path TEXT,
            resume_written_at TEXT,
            run_id TEXT,
            attempt_count INTEGER DEFAULT 0,
            last_error TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_jobs_status ON jobs(status);
        "#,
    )?;
    Ok(())
}
