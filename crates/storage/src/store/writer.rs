#![forbid(unsafe_code)]

use super::types::JobUpdate;
use super::{JobsStore, StoreError};
use rusqlite::params;
use std::collections::HashSet;

const FINALIZE_COLUMNS: [&str; 6] = [
    "updated_at",
    "resume_pdf_path",
    "resume_written_at",
    "run_id",
    "attempt_count",
    "last_error",
];

impl JobsStore {
    fn table_columns(&self) -> Result<HashSet<String>, StoreError> {
        let mut stmt = self.conn().prepare("PRAGMA table_info(jobs)")?;
        let names = stmt.query_map([], |row| row.get::<_, String>(1))?;
        Ok(names.collect::<Result<HashSet<_>, _>>()?)
    }

    /// Preflight for bulk status updates: `updated_at` must exist.
    pub fn ensure_update_columns(&self) -> Result<(), StoreError> {
        let columns = self.table_columns()?;
        if !columns.contains("updated_at") {
            return Err(StoreError::SchemaMigration {
                column: "updated_at".to_string(),
            });
        }
        Ok(())
    }

    /// Preflight for finalize: the full audit-column set must exist.
    pub fn ensure_finalize_columns(&self) -> Result<(), StoreError> {
        let columns = self.table_columns()?;
        for column in FINALIZE_COLUMNS {
            if !columns.contains(column) {
                return Err(StoreError::SchemaMigration {
                    column: column.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Returns the subset of `ids` with no matching row, in input order.
    pub fn missing_ids(&self, ids: &[i64]) -> Result<Vec<i64>, StoreError> {
        let mut stmt = self
            .conn()
            .prepare("SELECT COUNT(*) FROM jobs WHERE id = ?1")?;
        let mut missing = Vec::new();
        for id in ids {
            let count: i64 = stmt.query_row(params![id], |row| row.get(0))?;
            if count == 0 {
                missing.push(*id);
            }
        }
        Ok(missing)
    }

    /// Applies every update in a single transaction with one shared
    /// timestamp. Any miss rolls the whole batch back; no partial
    /// application is ever visible.
    pub fn bulk_update_status(
        &mut self,
        updates: &[JobUpdate],
        now: &str,
    ) -> Result<(), StoreError> {
        let tx = self.conn_mut().transaction()?;
        {
            let mut stmt =
                tx.prepare("UPDATE jobs SET status = ?1, updated_at = ?2 WHERE id = ?3")?;
            for update in updates {
                let rows = stmt.execute(params![update.status.as_str(), now, update.id])?;
                if rows != 1 {
                    return Err(StoreError::UpdateMismatch {
                        id: update.id,
                        rows,
                    });
                }
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Commits the resume-written state with audit fields. Increments
    /// `attempt_count` exactly once and clears `last_error`.
    pub fn finalize_resume_written(
        &mut self,
        id: i64,
        resume_pdf_path: &str,
        run_id: &str,
        now: &str,
    ) -> Result<(), StoreError> {
        let tx = self.conn_mut().transaction()?;
        let rows = tx.execute(
            "UPDATE jobs SET \
               status = 'resume_written', \
               resume_pdf_path = ?1, \
               resume_written_at = ?2, \
               run_id = ?3, \
               attempt_count = COALESCE(attempt_count, 0) + 1, \
               last_error = NULL, \
               updated_at = ?2 \
             WHERE id = ?4",
            params![resume_pdf_path, now, run_id, id],
        )?;
        if rows != 1 {
            return Err(StoreError::RowNotFound { id });
        }
        tx.commit()?;
        Ok(())
    }

    /// Compensation after a failed tracker projection: resets the status to
    /// `reviewed` and records the failure. The audit fields and
    /// `attempt_count` from the preceding finalize are left untouched (the
    /// attempt was real even though the projection failed).
    pub fn fallback_to_reviewed(
        &mut self,
        id: i64,
        last_error: &str,
        now: &str,
    ) -> Result<(), StoreError> {
        let tx = self.conn_mut().transaction()?;
        let rows = tx.execute(
            "UPDATE jobs SET status = 'reviewed', last_error = ?1, updated_at = ?2 WHERE id = ?3",
            params![last_error, now, id],
        )?;
        if rows != 1 {
            return Err(StoreError::RowNotFound { id });
        }
        tx.commit()?;
        Ok(())
    }
}
