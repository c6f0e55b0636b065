#![forbid(unsafe_code)]

//! Repository-root anchoring.
//!
//! Relative paths (db, trackers, capture, templates, trackers passed to
//! tools) resolve against `JOBWORKFLOW_ROOT`, never against the process's
//! working directory at call time.

use std::path::{Path, PathBuf};

pub fn workflow_root() -> PathBuf {
    if let Some(raw) = std::env::var_os("JOBWORKFLOW_ROOT")
        && !raw.is_empty()
    {
        return PathBuf::from(raw);
    }
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

pub fn resolve_repo_path(raw: &str) -> PathBuf {
    let path = Path::new(raw);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    workflow_root().join(path)
}
