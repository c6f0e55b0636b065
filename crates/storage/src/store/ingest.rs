#![forbid(unsafe_code)]

use super::types::{CleanJobRecord, IngestCounts};
use super::{JobsStore, StoreError};
use jw_core::status::JobStatus;
use rusqlite::params;

impl JobsStore {
    /// Inserts normalized records in one transaction, keyed on `url` with
    /// INSERT OR IGNORE. A dedupe hit on a live row never alters any
    /// existing field, including `status`.
    pub fn insert_cleaned(
        &mut self,
        records: &[CleanJobRecord],
        status: JobStatus,
        now: &str,
    ) -> Result<IngestCounts, StoreError> {
        let tx = self.conn_mut().transaction()?;
        let mut counts = IngestCounts::default();
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO jobs \
                 (job_id, title, company, description, url, location, source, \
                  status, captured_at, payload_json, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
            )?;
            for record in records {
                let changed = stmt.execute(params![
                    record.job_id,
                    record.title,
                    record.company,
                    record.description,
                    record.url,
                    record.location,
                    record.source,
                    status.as_str(),
                    record.captured_at,
                    record.payload_json,
                    now,
                ])?;
                if changed == 1 {
                    counts.inserted += 1;
                } else {
                    counts.duplicates += 1;
                }
            }
        }
        tx.commit()?;
        Ok(counts)
    }
}
