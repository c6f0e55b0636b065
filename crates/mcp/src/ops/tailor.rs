#![forbid(unsafe_code)]

//! career_tailor, phase A of the two-phase finalize: parse tracker,
//! bootstrap workspace, regenerate ai_context.md, compile the resume PDF.
//! Artifact-only; no DB or tracker-status side effects.

use crate::support::{
    DEFAULT_APPLICATIONS_DIR, DEFAULT_FULL_RESUME_PATH, DEFAULT_PDFLATEX_CMD,
    DEFAULT_RESUME_TEMPLATE_PATH, TrackerError, atomic_copy, compile_resume_pdf,
    ensure_workspace_dirs, extract_job_description, generate_run_id, parse_tracker,
    regenerate_ai_context, verify_pdf,
};
use crate::{
    args_object, ensure_known_keys, optional_bool, optional_string, require_items,
    validation_error,
};
use jw_core::paths::resolve_repo_path;
use jw_core::sanitize::sanitize_error_message;
use jw_core::slug::{find_placeholder, resolve_application_slug};
use serde_json::{Value, json};
use std::path::Path;

const ALLOWED_KEYS: [&str; 6] = [
    "items",
    "force",
    "full_resume_path",
    "resume_template_path",
    "applications_dir",
    "pdflatex_cmd",
];
const ITEM_KEYS: [&str; 2] = ["tracker_path", "job_db_id"];
const MAX_BATCH: usize = 100;

struct TailorItem {
    tracker_path: String,
    job_db_id: Option<i64>,
}

struct TailorOptions {
    force: bool,
    full_resume_path: String,
    resume_template_path: String,
    applications_dir: String,
    pdflatex_cmd: String,
}

pub(crate) fn run(args: &Value) -> Value {
    match execute(args) {
        Ok(payload) | Err(payload) => payload,
    }
}

fn execute(args: &Value) -> Result<Value, Value> {
    let args = args_object(args)?;
    ensure_known_keys(args, &ALLOWED_KEYS)?;

    let raw_items = require_items(args, "items", MAX_BATCH)?;
    if raw_items.is_empty() {
        return Err(validation_error("items must be a non-empty array"));
    }
    let items = raw_items
        .iter()
        .map(parse_item)
        .collect::<Result<Vec<_>, Value>>()?;

    let opts = TailorOptions {
        force: optional_bool(args, "force")?.unwrap_or(false),
        full_resume_path: optional_string(args, "full_resume_path")?
            .unwrap_or_else(|| DEFAULT_FULL_RESUME_PATH.to_string()),
        resume_template_path: optional_string(args, "resume_template_path")?
            .unwrap_or_else(|| DEFAULT_RESUME_TEMPLATE_PATH.to_string()),
        applications_dir: optional_string(args, "applications_dir")?
            .unwrap_or_else(|| DEFAULT_APPLICATIONS_DIR.to_string()),
        pdflatex_cmd: optional_string(args, "pdflatex_cmd")?
            .unwrap_or_else(|| DEFAULT_PDFLATEX_CMD.to_string()),
    };

    let run_id = generate_run_id("tailor");
    let mut results: Vec<Value> = Vec::with_capacity(items.len());
    let mut warnings: Vec<String> = Vec::new();

    for item in &items {
        results.push(process_item(item, &opts));
    }

    let success_count = results.iter().filter(|r| r["success"] == true).count();
    let failed_count = results.len() - success_count;

    // Handoff payload for finalize_resume_batch, keyed by resolved db id.
    let mut successful_items: Vec<Value> = Vec::new();
    for result in &results {
        if result["success"] != true {
            continue;
        }
        match result.get("job_db_id").and_then(|v| v.as_i64()) {
            Some(id) => successful_items.push(json!({
                "id": id,
                "tracker_path": result["tracker_path"],
                "resume_pdf_path": result["resume_pdf_path"],
            })),
            None => warnings.push(format!(
                "Item {} succeeded but has no job_db_id; excluded from successful_items",
                result["tracker_path"].as_str().unwrap_or("<unknown>")
            )),
        }
    }

    let mut response = serde_json::Map::new();
    response.insert("run_id".to_string(), json!(run_id));
    response.insert("total_count".to_string(), json!(results.len()));
    response.insert("success_count".to_string(), json!(success_count));
    response.insert("failed_count".to_string(), json!(failed_count));
    response.insert("results".to_string(), json!(results));
    response.insert("successful_items".to_string(), json!(successful_items));
    if !warnings.is_empty() {
        response.insert("warnings".to_string(), json!(warnings));
    }
    Ok(Value::Object(response))
}

fn parse_item(raw: &Value) -> Result<TailorItem, Value> {
    let Some(obj) = raw.as_object() else {
        return Err(validation_error("each item must be an object"));
    };
    for key in obj.keys() {
        if !ITEM_KEYS.contains(&key.as_str()) {
            return Err(validation_error(&format!("unknown field '{key}' in item")));
        }
    }
    let tracker_path = match obj.get("tracker_path") {
        Some(Value::String(path)) if !path.trim().is_empty() => path.to_string(),
        _ => {
            return Err(validation_error(
                "each item requires a non-empty tracker_path",
            ));
        }
    };
    let job_db_id = match obj.get("job_db_id") {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => match n.as_i64() {
            Some(id) if id > 0 => Some(id),
            _ => {
                return Err(validation_error(
                    "item job_db_id must be a positive integer",
                ));
            }
        },
        Some(_) => {
            return Err(validation_error(
                "item job_db_id must be a positive integer",
            ));
        }
    };
    Ok(TailorItem {
        tracker_path,
        job_db_id,
    })
}

fn process_item(item: &TailorItem, opts: &TailorOptions) -> Value {
    match tailor_one(item, opts) {
        Ok(result) => result,
        Err((code, message)) => {
            let mut obj = serde_json::Map::new();
            obj.insert("tracker_path".to_string(), json!(item.tracker_path));
            if let Some(id) = item.job_db_id {
                obj.insert("job_db_id".to_string(), json!(id));
            }
            obj.insert("action".to_string(), json!("failed"));
            obj.insert("success".to_string(), json!(false));
            obj.insert("error_code".to_string(), json!(code));
            obj.insert("error".to_string(), json!(sanitize_error_message(&message)));
            Value::Object(obj)
        }
    }
}

type ItemFailure = (&'static str, String);

fn tailor_one(item: &TailorItem, opts: &TailorOptions) -> Result<Value, ItemFailure> {
    let tracker_path = resolve_repo_path(&item.tracker_path);
    let doc = parse_tracker(&tracker_path).map_err(|err| match err {
        TrackerError::NotFound(message) => ("FILE_NOT_FOUND", message),
        TrackerError::Parse(message) | TrackerError::Io(message) => ("VALIDATION_ERROR", message),
    })?;

    let company = doc
        .field_str("company")
        .ok_or_else(|| {
            (
                "VALIDATION_ERROR",
                "Tracker frontmatter is missing required 'company' field".to_string(),
            )
        })?
        .to_string();
    let position = doc
        .field_str("position")
        .ok_or_else(|| {
            (
                "VALIDATION_ERROR",
                "Tracker frontmatter is missing required 'position' field".to_string(),
            )
        })?
        .to_string();
    let job_description = extract_job_description(&doc.body)
        .map_err(|err| ("VALIDATION_ERROR", err.message().to_string()))?;

    // Item-level override wins over the tracker's own job_db_id.
    let job_db_id = item.job_db_id.or_else(|| doc.field_positive_int("job_db_id"));
    let slug = resolve_application_slug(&company, &position, doc.field_str("resume_path"), job_db_id);

    let workspace = ensure_workspace_dirs(&opts.applications_dir, &slug)
        .map_err(|err| ("INTERNAL_ERROR", format!("Failed to create workspace: {err}")))?;
    let workspace_display = format!("{}/{slug}", opts.applications_dir.trim_end_matches('/'));

    let tex_path = workspace.join("resume").join("resume.tex");
    let template_path = resolve_repo_path(&opts.resume_template_path);
    let tex_action = materialize_resume_tex(
        &template_path,
        &tex_path,
        opts.force,
        &opts.resume_template_path,
    )?;

    regenerate_ai_context(
        &workspace,
        &company,
        &position,
        &job_description,
        &resolve_repo_path(&opts.full_resume_path),
    )
    .map_err(|message| ("FILE_NOT_FOUND", message))?;

    // Placeholder scan happens before compile; an un-tailored template is a
    // validation failure, not a compile failure.
    let tex_content = std::fs::read_to_string(&tex_path)
        .map_err(|err| ("INTERNAL_ERROR", format!("Failed to read resume.tex: {err}")))?;
    if let Some(token) = find_placeholder(&tex_content) {
        return Err((
            "VALIDATION_ERROR",
            format!("resume.tex contains placeholder token '{token}'; tailor the resume before compiling"),
        ));
    }

    compile_resume_pdf(&tex_path, &opts.pdflatex_cmd)
        .map_err(|message| ("COMPILE_ERROR", message))?;
    let pdf_path = workspace.join("resume").join("resume.pdf");
    verify_pdf(&pdf_path).map_err(|message| ("COMPILE_ERROR", message))?;

    let mut obj = serde_json::Map::new();
    obj.insert("tracker_path".to_string(), json!(item.tracker_path));
    if let Some(id) = job_db_id {
        obj.insert("job_db_id".to_string(), json!(id));
    }
    obj.insert("application_slug".to_string(), json!(slug));
    obj.insert("workspace_dir".to_string(), json!(workspace_display));
    obj.insert(
        "resume_tex_path".to_string(),
        json!(format!("{workspace_display}/resume/resume.tex")),
    );
    obj.insert(
        "ai_context_path".to_string(),
        json!(format!("{workspace_display}/resume/ai_context.md")),
    );
    obj.insert(
        "resume_pdf_path".to_string(),
        json!(format!("{workspace_display}/resume/resume.pdf")),
    );
    obj.insert("resume_tex_action".to_string(), json!(tex_action));
    obj.insert("action".to_string(), json!("tailored"));
    obj.insert("success".to_string(), json!(true));
    Ok(Value::Object(obj))
}

fn materialize_resume_tex(
    template: &Path,
    target: &Path,
    force: bool,
    template_display: &str,
) -> Result<&'static str, ItemFailure> {
    if !template.is_file() {
        return Err((
            "TEMPLATE_NOT_FOUND",
            format!("Resume template not found: {template_display}"),
        ));
    }
    if target.is_file() && !force {
        return Ok("preserved");
    }
    let action = if target.is_file() { "overwritten" } else { "created" };
    atomic_copy(template, target).map_err(|err| {
        (
            "INTERNAL_ERROR",
            format!("Failed to materialize resume.tex: {err}"),
        )
    })?;
    Ok(action)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt as _;
    use std::path::PathBuf;

    fn temp_root(test_name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "jw_mcp_tailor_{test_name}_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    fn write_fixtures(root: &PathBuf, template_body: &str) -> (PathBuf, Value) {
        let tracker = root.join("tracker.md");
        std::fs::write(
            &tracker,
            "---\njob_db_id: 3629\ncompany: Amazon\nposition: Software Engineer\n\
             status: Reviewed\n---\n\n## Job Description\n\nBuild scalable systems.\n\n## Notes\n",
        )
        .expect("write tracker");

        let template = root.join("template.tex");
        std::fs::write(&template, template_body).expect("write template");
        let full_resume = root.join("full_resume.md");
        std::fs::write(&full_resume, "# Jane Doe\nBackend work.\n").expect("write full resume");

        // pdflatex stand-in that emits a PDF beside the TEX.
        let compiler = root.join("fake-pdflatex.sh");
        std::fs::write(&compiler, "#!/bin/sh\nprintf '%%PDF-1.5 stub' > resume.pdf\n")
            .expect("write compiler");
        let mut perms = std::fs::metadata(&compiler).expect("meta").permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&compiler, perms).expect("chmod");

        let args = json!({
            "items": [{"tracker_path": tracker.to_string_lossy()}],
            "full_resume_path": full_resume.to_string_lossy(),
            "resume_template_path": template.to_string_lossy(),
            "applications_dir": root.join("apps").to_string_lossy(),
            "pdflatex_cmd": compiler.to_string_lossy(),
        });
        (tracker, args)
    }

    #[test]
    fn full_pipeline_produces_artifacts_and_handoff() {
        let root = temp_root("full_pipeline_produces_artifacts_and_handoff");
        let (_, args) = write_fixtures(&root, "\\documentclass{article} tailored");

        let result = run(&args);
        assert!(result["run_id"].as_str().expect("run_id").starts_with("tailor_"));
        assert_eq!(result["total_count"], 1);
        assert_eq!(result["success_count"], 1);
        assert_eq!(result["failed_count"], 0);

        let item = &result["results"][0];
        assert_eq!(item["action"], "tailored");
        assert_eq!(item["application_slug"], "amazon-3629");
        assert_eq!(item["resume_tex_action"], "created");
        assert_eq!(item["job_db_id"], 3629);

        let workspace = root.join("apps/amazon-3629");
        assert!(workspace.join("resume/resume.tex").is_file());
        assert!(workspace.join("resume/resume.pdf").is_file());
        let context = std::fs::read_to_string(workspace.join("resume/ai_context.md"))
            .expect("read context");
        assert!(context.contains("Build scalable systems."));
        assert!(context.contains("# Jane Doe"));

        let handoff = result["successful_items"].as_array().expect("handoff");
        assert_eq!(handoff.len(), 1);
        assert_eq!(handoff[0]["id"], 3629);
        assert!(result.get("warnings").is_none());
    }

    #[test]
    fn existing_tex_is_preserved_unless_forced() {
        let root = temp_root("existing_tex_is_preserved_unless_forced");
        let (_, args) = write_fixtures(&root, "template v1");
        run(&args);

        // Tailor the materialized TEX by hand, then re-run.
        let tex = root.join("apps/amazon-3629/resume/resume.tex");
        std::fs::write(&tex, "hand tailored").expect("edit tex");
        let result = run(&args);
        assert_eq!(result["results"][0]["resume_tex_action"], "preserved");
        assert_eq!(std::fs::read_to_string(&tex).expect("read"), "hand tailored");

        let mut forced = args.clone();
        forced["force"] = json!(true);
        let result = run(&forced);
        assert_eq!(result["results"][0]["resume_tex_action"], "overwritten");
        assert_eq!(std::fs::read_to_string(&tex).expect("read"), "template v1");
    }

    #[test]
    fn placeholder_template_fails_validation_before_compile() {
        let root = temp_root("placeholder_template_fails_validation_before_compile");
        let (_, args) = write_fixtures(&root, "\\section{Projects} PROJECT-AI-1");

        let result = run(&args);
        assert_eq!(result["success_count"], 0);
        let item = &result["results"][0];
        assert_eq!(item["action"], "failed");
        assert_eq!(item["error_code"], "VALIDATION_ERROR");
        assert!(
            item["error"]
                .as_str()
                .expect("error")
                .to_lowercase()
                .contains("placeholder")
        );
        // Compile never ran.
        assert!(!root.join("apps/amazon-3629/resume/resume.pdf").exists());
    }

    #[test]
    fn compile_failure_maps_to_compile_error_and_batch_continues() {
        let root = temp_root("compile_failure_maps_to_compile_error_and_batch_continues");
        let (tracker, mut args) = write_fixtures(&root, "tailored");
        let broken = root.join("broken-pdflatex.sh");
        std::fs::write(&broken, "#!/bin/sh\necho 'Undefined control sequence' >&2\nexit 1\n")
            .expect("write compiler");
        let mut perms = std::fs::metadata(&broken).expect("meta").permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&broken, perms).expect("chmod");
        args["pdflatex_cmd"] = json!(broken.to_string_lossy());
        args["items"] = json!([
            {"tracker_path": tracker.to_string_lossy()},
            {"tracker_path": "/nonexistent/tracker.md"},
        ]);

        let result = run(&args);
        assert_eq!(result["total_count"], 2);
        assert_eq!(result["failed_count"], 2);
        assert_eq!(result["results"][0]["error_code"], "COMPILE_ERROR");
        assert_eq!(result["results"][1]["error_code"], "FILE_NOT_FOUND");
    }

    #[test]
    fn missing_template_is_template_not_found() {
        let root = temp_root("missing_template_is_template_not_found");
        let (_, mut args) = write_fixtures(&root, "tailored");
        args["resume_template_path"] = json!(root.join("absent.tex").to_string_lossy());

        let result = run(&args);
        assert_eq!(result["results"][0]["error_code"], "TEMPLATE_NOT_FOUND");
    }

    #[test]
    fn success_without_job_db_id_is_excluded_from_handoff_with_warning() {
        let root = temp_root("success_without_job_db_id_is_excluded_from_handoff_with_warning");
        let (tracker, args) = write_fixtures(&root, "tailored");
        std::fs::write(
            &tracker,
            "---\ncompany: Amazon\nposition: Software Engineer\nstatus: Reviewed\n---\n\n\
             ## Job Description\n\nShip things.\n\n## Notes\n",
        )
        .expect("rewrite tracker without job_db_id");

        let result = run(&args);
        assert_eq!(result["success_count"], 1);
        assert_eq!(result["results"][0]["success"], true);
        assert_eq!(result["successful_items"], json!([]));
        let warnings = result["warnings"].as_array().expect("warnings");
        assert!(warnings[0].as_str().expect("warning").contains("job_db_id"));
    }

    #[test]
    fn request_level_validation_failures() {
        for bad in [
            json!({}),
            json!({"items": []}),
            json!({"items": [{"tracker_path": ""}]}),
            json!({"items": [{"tracker_path": "x.md", "job_db_id": 0}]}),
            json!({"items": [{"tracker_path": "x.md", "extra": 1}]}),
            json!({"items": [{"tracker_path": "x.md"}], "bogus": true}),
        ] {
            let result = run(&bad);
            assert_eq!(result["error"]["code"], "VALIDATION_ERROR", "args={bad}");
        }

        let oversize: Vec<Value> = (0..101).map(|i| json!({"tracker_path": format!("{i}.md")})).collect();
        let result = run(&json!({"items": oversize}));
        assert_eq!(result["error"]["code"], "VALIDATION_ERROR");
    }
}
