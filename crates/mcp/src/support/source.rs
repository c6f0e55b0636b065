#![forbid(unsafe_code)]

//! The external posting source behind a narrow seam. The production
//! implementation shells out to a scraper CLI that reads one JSON request on
//! stdin and emits a JSON array of raw records on stdout; tests substitute
//! the trait.

use serde_json::{Value, json};
use std::io::Write as _;
use std::process::{Command, Stdio};

#[derive(Debug, Clone)]
pub(crate) struct FetchRequest {
    pub(crate) term: String,
    pub(crate) location: String,
    pub(crate) sites: Vec<String>,
    pub(crate) results_wanted: i64,
    pub(crate) hours_old: i64,
}

pub(crate) trait JobSource {
    fn fetch(&self, request: &FetchRequest) -> Result<Vec<Value>, String>;
}

pub(crate) struct ScraperCommand {
    program: String,
    args: Vec<String>,
}

impl ScraperCommand {
    pub(crate) fn from_env() -> Self {
        let raw = std::env::var("JOBWORKFLOW_SCRAPER_CMD")
            .ok()
            .filter(|cmd| !cmd.trim().is_empty())
            .unwrap_or_else(|| "jobspy".to_string());
        let mut parts = raw.split_whitespace().map(str::to_string);
        let program = parts.next().unwrap_or_else(|| "jobspy".to_string());
        Self {
            program,
            args: parts.collect(),
        }
    }
}

impl JobSource for ScraperCommand {
    fn fetch(&self, request: &FetchRequest) -> Result<Vec<Value>, String> {
        let payload = json!({
            "term": request.term,
            "location": request.location,
            "sites": request.sites,
            "results_wanted": request.results_wanted,
            "hours_old": request.hours_old,
        });

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| format!("failed to spawn scraper command '{}': {err}", self.program))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(payload.to_string().as_bytes())
                .map_err(|err| format!("failed to write scraper request: {err}"))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|err| format!("failed to wait for scraper command: {err}"))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let summary = stderr.lines().next().unwrap_or("").trim().to_string();
            return Err(format!(
                "scraper command exited with {}: {summary}",
                output.status
            ));
        }

        let value: Value = serde_json::from_slice(&output.stdout)
            .map_err(|err| format!("scraper output is not valid JSON: {err}"))?;
        match value {
            Value::Array(records) => Ok(records),
            _ => Err("scraper output must be a JSON array of records".to_string()),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt as _;
    use std::path::PathBuf;

    fn stub_script(test_name: &str, body: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "jw_mcp_source_{test_name}_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        let script = dir.join("scraper.sh");
        std::fs::write(&script, format!("#!/bin/sh\n{body}\n")).expect("write script");
        let mut perms = std::fs::metadata(&script).expect("metadata").permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&script, perms).expect("chmod");
        script
    }

    fn request() -> FetchRequest {
        FetchRequest {
            term: "backend engineer".to_string(),
            location: "Ontario, Canada".to_string(),
            sites: vec!["linkedin".to_string()],
            results_wanted: 20,
            hours_old: 2,
        }
    }

    #[test]
    fn parses_a_json_array_from_stdout() {
        let script = stub_script(
            "parses_a_json_array_from_stdout",
            r#"cat > /dev/null; echo '[{"job_url": "https://example.com/1"}]'"#,
        );
        let source = ScraperCommand {
            program: script.to_string_lossy().to_string(),
            args: Vec::new(),
        };
        let records = source.fetch(&request()).expect("fetch");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["job_url"], "https://example.com/1");
    }

    #[test]
    fn nonzero_exit_surfaces_stderr_summary() {
        let script = stub_script(
            "nonzero_exit_surfaces_stderr_summary",
            "cat > /dev/null; echo 'rate limited' >&2; exit 3",
        );
        let source = ScraperCommand {
            program: script.to_string_lossy().to_string(),
            args: Vec::new(),
        };
        let err = source.fetch(&request()).expect_err("must fail");
        assert!(err.contains("rate limited"));
    }

    #[test]
    fn non_array_output_is_rejected() {
        let script = stub_script(
            "non_array_output_is_rejected",
            r#"cat > /dev/null; echo '{"not": "an array"}'"#,
        );
        let source = ScraperCommand {
            program: script.to_string_lossy().to_string(),
            args: Vec::new(),
        };
        let err = source.fetch(&request()).expect_err("must fail");
        assert!(err.contains("JSON array"));
    }
}
