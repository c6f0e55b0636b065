#![forbid(unsafe_code)]

//! Tracker markdown adapter: delimited-YAML frontmatter + body.
//!
//! Parsing decodes the frontmatter with serde_yaml; status mutation is a
//! line-level rewrite so every other byte of the file survives verbatim.

use super::fsops::atomic_write;
use jw_storage::JobRow;
use serde_yaml::Value as YamlValue;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub(crate) enum TrackerError {
    NotFound(String),
    Parse(String),
    Io(String),
}

impl TrackerError {
    pub(crate) fn message(&self) -> &str {
        match self {
            Self::NotFound(msg) | Self::Parse(msg) | Self::Io(msg) => msg,
        }
    }
}

impl std::fmt::Display for TrackerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug)]
pub(crate) struct TrackerDoc {
    pub(crate) frontmatter: serde_yaml::Mapping,
    pub(crate) body: String,
    pub(crate) status: String,
}

impl TrackerDoc {
    pub(crate) fn field_str(&self, key: &str) -> Option<&str> {
        self.frontmatter
            .get(&YamlValue::String(key.to_string()))
            .and_then(|value| value.as_str())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// `job_db_id` may be an integer or a numeric string in legacy files.
    pub(crate) fn field_positive_int(&self, key: &str) -> Option<i64> {
        let value = self.frontmatter.get(&YamlValue::String(key.to_string()))?;
        let parsed = match value {
            YamlValue::Number(n) => n.as_i64(),
            YamlValue::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        parsed.filter(|id| *id > 0)
    }
}

pub(crate) fn parse_tracker(path: &Path) -> Result<TrackerDoc, TrackerError> {
    if !path.is_file() {
        return Err(TrackerError::NotFound(format!(
            "Tracker file not found: {}",
            path.to_string_lossy()
        )));
    }
    let content = std::fs::read_to_string(path).map_err(|_| {
        TrackerError::NotFound(format!(
            "Tracker file not readable: {}",
            path.to_string_lossy()
        ))
    })?;
    let (yaml_block, body) = split_frontmatter(&content).ok_or_else(|| {
        TrackerError::Parse(
            "Tracker file does not contain valid YAML frontmatter delimited by '---'".to_string(),
        )
    })?;
    let frontmatter: YamlValue = serde_yaml::from_str(yaml_block)
        .map_err(|err| TrackerError::Parse(format!("Invalid YAML in frontmatter: {err}")))?;
    let mapping = match frontmatter {
        YamlValue::Mapping(mapping) => mapping,
        _ => {
            return Err(TrackerError::Parse(
                "Frontmatter must be a YAML mapping".to_string(),
            ));
        }
    };
    let status = mapping
        .get(&YamlValue::String("status".to_string()))
        .and_then(|value| value.as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            TrackerError::Parse(
                "Tracker frontmatter is missing required 'status' field".to_string(),
            )
        })?;
    Ok(TrackerDoc {
        frontmatter: mapping,
        body: body.to_string(),
        status,
    })
}

/// Splits `---\n<yaml>\n---\n<body>`. Returns `None` when the outer
/// delimiters are missing.
fn split_frontmatter(content: &str) -> Option<(&str, &str)> {
    let mut lines = content.split_inclusive('\n');
    let first = lines.next()?;
    if first.trim_end() != "---" {
        return None;
    }
    let fm_start = first.len();
    let mut cursor = fm_start;
    for line in lines {
        if line.trim_end() == "---" {
            let yaml = &content[fm_start..cursor];
            let body = &content[cursor + line.len()..];
            return Some((yaml, body));
        }
        cursor += line.len();
    }
    None
}

/// Extracts the `## Job Description` section: everything until the next
/// level-1 or level-2 heading, trimmed.
pub(crate) fn extract_job_description(body: &str) -> Result<String, TrackerError> {
    let lines: Vec<&str> = body.split('\n').collect();
    let start = lines
        .iter()
        .position(|line| is_job_description_heading(line))
        .ok_or_else(|| {
            TrackerError::Parse(
                "Tracker is missing required '## Job Description' heading".to_string(),
            )
        })?;

    let mut section = Vec::new();
    for line in &lines[start + 1..] {
        if is_breaking_heading(line) {
            break;
        }
        section.push(*line);
    }
    Ok(section.join("\n").trim().to_string())
}

fn is_job_description_heading(line: &str) -> bool {
    let trimmed = line.trim();
    let Some(rest) = trimmed.strip_prefix("##") else {
        return false;
    };
    if rest.starts_with('#') {
        return false;
    }
    let words: Vec<&str> = rest.split_whitespace().collect();
    words.len() == 2
        && words[0].eq_ignore_ascii_case("job")
        && words[1].eq_ignore_ascii_case("description")
}

fn is_breaking_heading(line: &str) -> bool {
    if let Some(rest) = line.strip_prefix("##") {
        return rest.starts_with(|c: char| c == ' ' || c == '\t');
    }
    if let Some(rest) = line.strip_prefix('#') {
        return rest.starts_with(|c: char| c == ' ' || c == '\t');
    }
    false
}

/// Rewrites only the `status:` line inside the frontmatter block; all other
/// frontmatter bytes and the entire body are preserved verbatim.
pub(crate) fn rewrite_status_line(content: &str, target: &str) -> Option<String> {
    let mut out = String::with_capacity(content.len() + 16);
    let mut lines = content.split_inclusive('\n');

    let first = lines.next()?;
    if first.trim_end() != "---" {
        return None;
    }
    out.push_str(first);

    let mut replaced = false;
    let mut closed = false;
    for line in lines {
        if !closed && !replaced && line.starts_with("status:") {
            out.push_str("status: ");
            out.push_str(target);
            if line.ends_with('\n') {
                out.push('\n');
            }
            replaced = true;
            continue;
        }
        if !closed && line.trim_end() == "---" {
            closed = true;
        }
        out.push_str(line);
    }

    (replaced && closed).then_some(out)
}

pub(crate) fn update_tracker_status_file(path: &Path, target: &str) -> Result<(), TrackerError> {
    let content = std::fs::read_to_string(path).map_err(|err| {
        TrackerError::Io(format!("Failed to read tracker for status update: {err}"))
    })?;
    let updated = rewrite_status_line(&content, target).ok_or_else(|| {
        TrackerError::Parse(
            "Tracker frontmatter has no status line to update".to_string(),
        )
    })?;
    atomic_write(path, updated.as_bytes())
        .map_err(|err| TrackerError::Io(format!("Failed to write tracker: {err}")))
}

/// Renders a fresh tracker for a shortlisted job: stable frontmatter order,
/// `status: Reviewed`, and the required body sections.
pub(crate) fn render_tracker(job: &JobRow, application_slug: &str, date: &str) -> String {
    let company = job.company.as_deref().unwrap_or("");
    let position = job.title.as_deref().unwrap_or("");
    let description = job.description.as_deref().unwrap_or("");
    let job_id = job.job_id.as_deref().unwrap_or("");

    let mut out = String::new();
    out.push_str("---\n");
    out.push_str(&format!("job_db_id: {}\n", job.id));
    out.push_str(&format!("job_id: {}\n", yaml_scalar(job_id)));
    out.push_str(&format!("company: {}\n", yaml_scalar(company)));
    out.push_str(&format!("position: {}\n", yaml_scalar(position)));
    out.push_str("status: Reviewed\n");
    out.push_str(&format!("application_date: {date}\n"));
    out.push_str(&format!("reference_link: {}\n", yaml_scalar(&job.url)));
    out.push_str(&format!(
        "resume_path: '[[data/applications/{application_slug}/resume/resume.pdf]]'\n"
    ));
    out.push_str(&format!(
        "cover_letter_path: '[[data/applications/{application_slug}/cover/cover-letter.pdf]]'\n"
    ));
    out.push_str("---\n\n## Job Description\n\n");
    out.push_str(description);
    if !description.is_empty() {
        out.push('\n');
    }
    out.push_str("\n## Notes\n");
    out
}

fn yaml_scalar(raw: &str) -> String {
    if raw.is_empty() {
        return "''".to_string();
    }
    let needs_quote = raw.starts_with(|c: char| c.is_whitespace() || matches!(c, '-' | '?' | '!'))
        || raw.ends_with(char::is_whitespace)
        || raw.chars().any(|c| {
            matches!(
                c,
                ':' | '#' | '\'' | '"' | '[' | ']' | '{' | '}' | ',' | '&' | '*' | '|' | '>'
                    | '%' | '@' | '`'
            )
        });
    if needs_quote {
        format!("'{}'", raw.replace('\'', "''"))
    } else {
        raw.to_string()
    }
}

/// Legacy-reference dedupe: finds an existing tracker whose frontmatter
/// `reference_link` equals the job URL. Scans in sorted filename order for
/// determinism; unreadable or malformed files are skipped.
pub(crate) fn find_tracker_by_reference(trackers_dir: &Path, url: &str) -> Option<PathBuf> {
    let entries = std::fs::read_dir(trackers_dir).ok()?;
    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file() && path.extension().is_some_and(|ext| ext == "md")
        })
        .collect();
    candidates.sort();

    for path in candidates {
        let Ok(content) = std::fs::read_to_string(&path) else {
            continue;
        };
        let Some((yaml_block, _)) = split_frontmatter(&content) else {
            continue;
        };
        let Ok(YamlValue::Mapping(mapping)) = serde_yaml::from_str::<YamlValue>(yaml_block) else {
            continue;
        };
        let reference = mapping
            .get(&YamlValue::String("reference_link".to_string()))
            .and_then(|value| value.as_str());
        if reference == Some(url) {
            return Some(path);
        }
    }
    None
}
