#![forbid(unsafe_code)]

//! Application workspace paths and the resume-artifact guardrails.

use jw_core::paths::resolve_repo_path;
use jw_core::slug::find_placeholder;
use std::path::{Path, PathBuf};

pub(crate) const DEFAULT_APPLICATIONS_DIR: &str = "data/applications";
const WORKSPACE_SUBDIRS: [&str; 3] = ["resume", "cover", "cv"];

pub(crate) fn workspace_dir(applications_dir: &str, slug: &str) -> PathBuf {
    resolve_repo_path(applications_dir).join(slug)
}

/// Idempotently creates `<apps_root>/<slug>/{resume,cover,cv}`.
pub(crate) fn ensure_workspace_dirs(applications_dir: &str, slug: &str) -> std::io::Result<PathBuf> {
    let workspace = workspace_dir(applications_dir, slug);
    for subdir in WORKSPACE_SUBDIRS {
        std::fs::create_dir_all(workspace.join(subdir))?;
    }
    Ok(workspace)
}

/// Companion `resume.tex` for a given `resume.pdf` path.
pub(crate) fn resume_tex_from_pdf(pdf: &Path) -> PathBuf {
    pdf.with_extension("tex")
}

/// The Resume-Written guardrails: the PDF exists and is non-empty, the
/// companion TEX exists, and the TEX carries no placeholder token.
pub(crate) fn check_resume_artifacts(pdf: &Path, tex: &Path) -> Result<(), String> {
    let pdf_name = pdf.to_string_lossy();
    let metadata = std::fs::metadata(pdf)
        .map_err(|_| format!("resume.pdf not found: {pdf_name}"))?;
    if !metadata.is_file() {
        return Err(format!("resume.pdf is not a regular file: {pdf_name}"));
    }
    if metadata.len() == 0 {
        return Err(format!("resume.pdf is empty: {pdf_name}"));
    }

    let tex_name = tex.to_string_lossy();
    if !tex.is_file() {
        return Err(format!("resume.tex not found: {tex_name}"));
    }
    let tex_content = std::fs::read_to_string(tex)
        .map_err(|_| format!("resume.tex not readable: {tex_name}"))?;
    if let Some(token) = find_placeholder(&tex_content) {
        return Err(format!(
            "resume.tex contains placeholder token '{token}'; tailor the resume before committing"
        ));
    }
    Ok(())
}
