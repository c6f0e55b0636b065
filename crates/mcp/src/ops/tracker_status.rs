#![forbid(unsafe_code)]

//! update_tracker_status: single-file, projection-only status transition
//! with policy checks and Resume-Written artifact guardrails.

use crate::support::{
    TrackerDoc, TrackerError, check_resume_artifacts, parse_tracker, resume_tex_from_pdf,
    update_tracker_status_file,
};
use crate::{
    args_object, ensure_known_keys, internal_error, optional_bool, require_nonempty_string,
    tool_error, validation_error,
};
use jw_core::paths::resolve_repo_path;
use jw_core::slug::strip_wiki_link;
use jw_core::status::{Transition, TrackerStatus, evaluate_transition};
use serde_json::{Value, json};

const ALLOWED_KEYS: [&str; 4] = ["tracker_path", "target_status", "dry_run", "force"];

pub(crate) fn run(args: &Value) -> Value {
    match execute(args) {
        Ok(payload) | Err(payload) => payload,
    }
}

fn execute(args: &Value) -> Result<Value, Value> {
    let args = args_object(args)?;
    ensure_known_keys(args, &ALLOWED_KEYS)?;

    let tracker_path_raw = require_nonempty_string(args, "tracker_path")?;
    let target_raw = require_nonempty_string(args, "target_status")?;
    let target = TrackerStatus::parse(&target_raw).ok_or_else(|| {
        validation_error(&format!(
            "Invalid target_status '{target_raw}'. Allowed: {}",
            TrackerStatus::allowed_values()
        ))
    })?;
    let dry_run = optional_bool(args, "dry_run")?.unwrap_or(false);
    let force = optional_bool(args, "force")?.unwrap_or(false);

    let path = resolve_repo_path(&tracker_path_raw);
    let doc = parse_tracker(&path).map_err(tracker_error_payload)?;
    let previous = doc.status.clone();

    let mut response = Response::new(&tracker_path_raw, &previous, target, dry_run);

    // Same status: nothing would be written, so guardrails are not consulted.
    if matches!(evaluate_transition(&previous, target), Transition::Noop) {
        return Ok(response.finish(if dry_run { "would_noop" } else { "noop" }, true));
    }

    if matches!(evaluate_transition(&previous, target), Transition::Blocked) {
        if !force {
            response.error = Some(format!(
                "Transition from '{previous}' to '{}' is not allowed by policy; \
                 pass force=true to override",
                target.as_str()
            ));
            return Ok(response.finish("blocked", false));
        }
        response.warnings.push(format!(
            "Forced transition from '{previous}' to '{}' bypasses the standard policy",
            target.as_str()
        ));
    }

    // Guardrails run for every Resume Written target, force included.
    if target == TrackerStatus::ResumeWritten {
        match resume_written_guardrails(&doc) {
            Ok(()) => response.guardrail_check_passed = Some(true),
            Err(message) => {
                response.guardrail_check_passed = Some(false);
                response.error = Some(message);
                return Ok(response.finish("blocked", false));
            }
        }
    }

    if dry_run {
        return Ok(response.finish("would_update", true));
    }

    update_tracker_status_file(&path, target.as_str())
        .map_err(|err| internal_error(err.message()))?;
    Ok(response.finish("updated", true))
}

fn resume_written_guardrails(doc: &TrackerDoc) -> Result<(), String> {
    let resume_path = doc.field_str("resume_path").ok_or_else(|| {
        "Tracker frontmatter is missing 'resume_path'; cannot locate resume.pdf".to_string()
    })?;
    let pdf = resolve_repo_path(strip_wiki_link(resume_path));
    let tex = resume_tex_from_pdf(&pdf);
    check_resume_artifacts(&pdf, &tex)
}

fn tracker_error_payload(err: TrackerError) -> Value {
    match err {
        TrackerError::NotFound(message) => tool_error("FILE_NOT_FOUND", &message),
        TrackerError::Parse(message) => validation_error(&message),
        TrackerError::Io(message) => internal_error(&message),
    }
}

struct Response {
    tracker_path: String,
    previous_status: String,
    target_status: &'static str,
    dry_run: bool,
    warnings: Vec<String>,
    guardrail_check_passed: Option<bool>,
    error: Option<String>,
}

impl Response {
    fn new(tracker_path: &str, previous: &str, target: TrackerStatus, dry_run: bool) -> Self {
        Self {
            tracker_path: tracker_path.to_string(),
            previous_status: previous.to_string(),
            target_status: target.as_str(),
            dry_run,
            warnings: Vec::new(),
            guardrail_check_passed: None,
            error: None,
        }
    }

    fn finish(self, action: &str, success: bool) -> Value {
        let mut obj = serde_json::Map::new();
        obj.insert("tracker_path".to_string(), json!(self.tracker_path));
        obj.insert("previous_status".to_string(), json!(self.previous_status));
        obj.insert("target_status".to_string(), json!(self.target_status));
        obj.insert("action".to_string(), json!(action));
        obj.insert("success".to_string(), json!(success));
        obj.insert("dry_run".to_string(), json!(self.dry_run));
        if let Some(passed) = self.guardrail_check_passed {
            obj.insert("guardrail_check_passed".to_string(), json!(passed));
        }
        if let Some(error) = self.error {
            obj.insert("error".to_string(), json!(error));
        }
        obj.insert("warnings".to_string(), json!(self.warnings));
        Value::Object(obj)
    }
}
