#![forbid(unsafe_code)]

//! The shared atomic-write primitive. Every filesystem mutation in the
//! server goes through here: parent mkdir, sibling temp file, fsync, rename,
//! temp cleanup on any failure. The target is never observable half-written.

use std::io::Write as _;
use std::path::{Path, PathBuf};

pub(crate) fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = temp_sibling(path)?;
    let result = write_and_rename(&tmp, path, content);
    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    result
}

pub(crate) fn atomic_copy(src: &Path, dest: &Path) -> std::io::Result<()> {
    let content = std::fs::read(src)?;
    atomic_write(dest, &content)
}

fn temp_sibling(path: &Path) -> std::io::Result<PathBuf> {
    let file_name = path
        .file_name()
        .ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name")
        })?
        .to_string_lossy()
        .to_string();
    let nonce = format!(
        "{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    );
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    Ok(parent.join(format!(".{file_name}.{nonce}.tmp")))
}

fn write_and_rename(tmp: &Path, target: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut file = std::fs::File::create(tmp)?;
    file.write_all(content)?;
    file.sync_all()?;
    drop(file);
    std::fs::rename(tmp, target)?;
    Ok(())
}
