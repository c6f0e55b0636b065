#![forbid(unsafe_code)]

use super::cursor::{PageCursor, encode_cursor};
use super::types::{JobRow, NewJobsPage};
use super::{JobsStore, StoreError};
use rusqlite::Row;

const JOB_COLUMNS: &str =
    "id, job_id, title, company, description, url, location, source, status, captured_at";

impl JobsStore {
    /// Pages through the `new` queue ordered by `(captured_at DESC, id DESC)`.
    /// Over-fetches by one row to decide `has_more`; the returned cursor
    /// encodes the position of the last row on the page.
    pub fn query_new(
        &self,
        limit: usize,
        cursor: Option<&PageCursor>,
    ) -> Result<NewJobsPage, StoreError> {
        let fetch = limit + 1;
        let mut jobs = match cursor {
            Some(cursor) => {
                let sql = format!(
                    "SELECT {JOB_COLUMNS} FROM jobs \
                     WHERE status = 'new' \
                       AND (captured_at < ?1 OR (captured_at = ?1 AND id < ?2)) \
                     ORDER BY captured_at DESC, id DESC LIMIT ?3"
                );
                let mut stmt = self.conn().prepare(&sql)?;
                let rows = stmt.query_map(
                    rusqlite::params![cursor.captured_at, cursor.id, fetch as i64],
                    job_row_from,
                )?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let sql = format!(
                    "SELECT {JOB_COLUMNS} FROM jobs \
                     WHERE status = 'new' \
                     ORDER BY captured_at DESC, id DESC LIMIT ?1"
                );
                let mut stmt = self.conn().prepare(&sql)?;
                let rows = stmt.query_map(rusqlite::params![fetch as i64], job_row_from)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };

        let has_more = jobs.len() > limit;
        jobs.truncate(limit);
        let next_cursor = if has_more {
            jobs.last().map(|row| {
                encode_cursor(&PageCursor {
                    captured_at: row.captured_at.clone().unwrap_or_default(),
                    id: row.id,
                })
            })
        } else {
            None
        };

        Ok(NewJobsPage {
            jobs,
            has_more,
            next_cursor,
        })
    }

    /// Shortlisted rows for tracker projection, newest first.
    pub fn query_shortlist(&self, limit: usize) -> Result<Vec<JobRow>, StoreError> {
        let sql = format!(
            "SELECT {JOB_COLUMNS} FROM jobs \
             WHERE status = 'shortlist' \
             ORDER BY captured_at DESC, id DESC LIMIT ?1"
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params![limit as i64], job_row_from)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

fn job_row_from(row: &Row<'_>) -> rusqlite::Result<JobRow> {
    Ok(JobRow {
        id: row.get(0)?,
        job_id: non_empty(row.get(1)?),
        title: non_empty(row.get(2)?),
        company: non_empty(row.get(3)?),
        description: non_empty(row.get(4)?),
        url: row.get(5)?,
        location: non_empty(row.get(6)?),
        source: non_empty(row.get(7)?),
        status: row.get(8)?,
        captured_at: non_empty(row.get(9)?),
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}
