#![forbid(unsafe_code)]

//! Slug normalization and application-slug resolution.
//!
//! A slug names one application workspace directory. Resolution is
//! deterministic so the same job always maps to the same workspace no matter
//! which caller references it: the canonical `resume_path` wins, then
//! company + db id, then company + position.

/// Reserved template substrings whose presence in a committed `resume.tex`
/// marks it as un-tailored and blocks the `Resume Written` transition.
pub const PLACEHOLDER_TOKENS: [&str; 3] = ["PROJECT-AI-", "PROJECT-BE-", "WORK-BULLET-POINT-"];

pub fn find_placeholder(text: &str) -> Option<&'static str> {
    PLACEHOLDER_TOKENS
        .into_iter()
        .find(|token| text.contains(token))
}

/// Lowercases, collapses every run of non-alphanumeric characters into one
/// `_`, and trims leading/trailing `_`. Empty input yields `query`.
pub fn normalize_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_separator = false;
    for ch in raw.chars() {
        if ch.is_alphanumeric() {
            if pending_separator && !out.is_empty() {
                out.push('_');
            }
            pending_separator = false;
            for lower in ch.to_lowercase() {
                out.push(lower);
            }
        } else {
            pending_separator = true;
        }
    }
    if out.is_empty() {
        return "query".to_string();
    }
    out
}

/// Strips an Obsidian wiki link wrapper: `[[path]]` becomes `path`. Plain
/// paths pass through unchanged. Surrounding whitespace is trimmed.
pub fn strip_wiki_link(raw: &str) -> &str {
    let trimmed = raw.trim();
    if let Some(inner) = trimmed.strip_prefix("[[").and_then(|rest| rest.strip_suffix("]]")) {
        return inner.trim();
    }
    trimmed
}

/// Extracts `<slug>` from a canonical `<apps_root>/<slug>/resume/resume.pdf`
/// path, wiki-linked or plain. Returns `None` when the path does not match
/// the canonical layout.
pub fn extract_slug_from_resume_path(resume_path: &str) -> Option<String> {
    let path = strip_wiki_link(resume_path);
    let components: Vec<&str> = path.split('/').filter(|part| !part.is_empty()).collect();
    if components.len() < 3 {
        return None;
    }
    if components[components.len() - 1] != "resume.pdf"
        || components[components.len() - 2] != "resume"
    {
        return None;
    }
    let slug = components[components.len() - 3];
    if slug.is_empty() {
        return None;
    }
    Some(slug.to_string())
}

/// Deterministic application-slug resolution:
/// 1. slug embedded in the canonical `resume_path`,
/// 2. `normalize(company)-<job_db_id>`,
/// 3. `normalize(company)-normalize(position)`.
pub fn resolve_application_slug(
    company: &str,
    position: &str,
    resume_path: Option<&str>,
    job_db_id: Option<i64>,
) -> String {
    if let Some(raw) = resume_path
        && let Some(slug) = extract_slug_from_resume_path(raw)
    {
        return slug;
    }
    if let Some(id) = job_db_id {
        return format!("{}-{}", normalize_text(company), id);
    }
    format!("{}-{}", normalize_text(company), normalize_text(position))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_runs_and_trims() {
        assert_eq!(normalize_text("General Motors"), "general_motors");
        assert_eq!(normalize_text("AT&T Inc."), "at_t_inc");
        assert_eq!(normalize_text("Backend/Full-Stack Developer"), "backend_full_stack_developer");
        assert_eq!(normalize_text("Test  --  Multiple"), "test_multiple");
        assert_eq!(normalize_text("  Amazon  "), "amazon");
        assert_eq!(normalize_text("--Meta--"), "meta");
        assert_eq!(normalize_text("(Google)"), "google");
        assert_eq!(normalize_text("Engineer v2.0"), "engineer_v2_0");
        assert_eq!(normalize_text("software_engineer"), "software_engineer");
    }

    #[test]
    fn normalize_empty_falls_back_to_query() {
        assert_eq!(normalize_text(""), "query");
        assert_eq!(normalize_text("---"), "query");
        assert_eq!(normalize_text("   "), "query");
    }

    #[test]
    fn wiki_links_are_stripped() {
        assert_eq!(strip_wiki_link("[[data/a/b.pdf]]"), "data/a/b.pdf");
        assert_eq!(strip_wiki_link("data/a/b.pdf"), "data/a/b.pdf");
        assert_eq!(strip_wiki_link("  [[ x ]]  "), "x");
    }

    #[test]
    fn slug_extraction_from_canonical_paths() {
        assert_eq!(
            extract_slug_from_resume_path("[[data/applications/amazon-3629/resume/resume.pdf]]"),
            Some("amazon-3629".to_string())
        );
        assert_eq!(
            extract_slug_from_resume_path("data/applications/meta-100/resume/resume.pdf"),
            Some("meta-100".to_string())
        );
        assert_eq!(
            extract_slug_from_resume_path("data/applications/google-staff_engineer/resume/resume.pdf"),
            Some("google-staff_engineer".to_string())
        );
    }

    #[test]
    fn slug_extraction_rejects_non_canonical_paths() {
        assert_eq!(extract_slug_from_resume_path("resume/resume.pdf"), None);
        assert_eq!(extract_slug_from_resume_path("data/applications/x/cover/cover.pdf"), None);
        assert_eq!(extract_slug_from_resume_path("data/applications/x/resume/other.pdf"), None);
        assert_eq!(extract_slug_from_resume_path(""), None);
    }

    #[test]
    fn resolution_prefers_resume_path_then_id_then_position() {
        assert_eq!(
            resolve_application_slug(
                "Amazon",
                "SDE",
                Some("[[data/applications/amazon-3629/resume/resume.pdf]]"),
                Some(999),
            ),
            "amazon-3629"
        );
        assert_eq!(
            resolve_application_slug("General Motors", "SDE", None, Some(3711)),
            "general_motors-3711"
        );
        assert_eq!(
            resolve_application_slug("Google", "Staff Engineer", None, None),
            "google-staff_engineer"
        );
        // Unparsable resume_path falls through to the next rule.
        assert_eq!(
            resolve_application_slug("Meta", "SWE", Some("weird/path.pdf"), Some(7)),
            "meta-7"
        );
    }
}
