#![forbid(unsafe_code)]

//! `ai_context.md` regeneration: the per-application briefing that pairs the
//! full-resume source with the tracker's job description.

use super::fsops::atomic_write;
use std::path::{Path, PathBuf};

pub(crate) const DEFAULT_FULL_RESUME_PATH: &str = "data/templates/full_resume_example.md";
pub(crate) const DEFAULT_RESUME_TEMPLATE_PATH: &str = "data/templates/resume_skeleton_example.tex";

pub(crate) fn render_ai_context(
    company: &str,
    position: &str,
    job_description: &str,
    full_resume: &str,
) -> String {
    let mut out = String::new();
    out.push_str("# AI Tailoring Context\n\n");
    out.push_str("## Target\n\n");
    out.push_str(&format!("- Company: {company}\n"));
    out.push_str(&format!("- Position: {position}\n\n"));
    out.push_str("## Job Description\n\n");
    out.push_str(job_description);
    out.push_str("\n\n## Full Resume\n\n");
    out.push_str(full_resume);
    if !full_resume.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// Rebuilds `resume/ai_context.md` in the workspace from the full-resume
/// markdown and the parsed job description. Regenerated on every successful
/// tailoring run.
pub(crate) fn regenerate_ai_context(
    workspace: &Path,
    company: &str,
    position: &str,
    job_description: &str,
    full_resume_path: &Path,
) -> Result<PathBuf, String> {
    let full_resume = std::fs::read_to_string(full_resume_path).map_err(|_| {
        format!(
            "Full resume source not found: {}",
            full_resume_path.to_string_lossy()
        )
    })?;
    let content = render_ai_context(company, position, job_description, &full_resume);
    let target = workspace.join("resume").join("ai_context.md");
    atomic_write(&target, content.as_bytes())
        .map_err(|err| format!("Failed to write ai_context.md: {err}"))?;
    Ok(target)
}
