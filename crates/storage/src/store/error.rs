#![forbid(unsafe_code)]

use std::path::PathBuf;

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Sql(rusqlite::Error),
    DbNotFound(PathBuf),
    SchemaMigration {
        column: String,
    },
    RowNotFound {
        id: i64,
    },
    UpdateMismatch {
        id: i64,
        rows: usize,
    },
    InvalidCursor,
    InvalidInput(&'static str),
}

impl StoreError {
    /// Error-taxonomy code surfaced to tool callers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io(_) | Self::Sql(_) => "DB_ERROR",
            Self::DbNotFound(_) => "DB_NOT_FOUND",
            Self::SchemaMigration { .. } => "DB_ERROR",
            Self::RowNotFound { .. } | Self::UpdateMismatch { .. } => "DB_ERROR",
            Self::InvalidCursor | Self::InvalidInput(_) => "VALIDATION_ERROR",
        }
    }

    pub fn retryable(&self) -> bool {
        matches!(
            self,
            Self::Io(_)
                | Self::Sql(_)
                | Self::SchemaMigration { .. }
                | Self::RowNotFound { .. }
                | Self::UpdateMismatch { .. }
        )
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io: {err}"),
            Self::Sql(err) => write!(f, "sqlite: {err}"),
            Self::DbNotFound(path) => {
                write!(f, "database file not found: {}", path.to_string_lossy())
            }
            Self::SchemaMigration { column } => write!(
                f,
                "jobs schema is missing column '{column}'; schema migration required"
            ),
            Self::RowNotFound { id } => write!(f, "job row not found (id={id})"),
            Self::UpdateMismatch { id, rows } => {
                write!(f, "status write affected {rows} rows for id={id}, expected 1")
            }
            Self::InvalidCursor => write!(f, "cursor is not a valid pagination token"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sql(value)
    }
}
