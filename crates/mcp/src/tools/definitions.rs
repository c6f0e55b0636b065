#![forbid(unsafe_code)]

use serde_json::{Value, json};

pub(crate) fn tool_definitions() -> Vec<Value> {
    vec![
        json!({
            "name": "scrape_jobs",
            "description": "Scrape fresh job postings from external sources and ingest them \
                into the jobs database. Multi-term, per-term isolation, DNS preflight with \
                retry, normalization, filtering, optional capture artifacts, idempotent \
                dedupe by URL. Ingestion-only: feeds the 'new' queue, never triages.",
            "inputSchema": json!({
                "type": "object",
                "properties": {
                    "terms": { "type": "array", "items": { "type": "string" } },
                    "location": { "type": "string" },
                    "sites": { "type": "array", "items": { "type": "string" } },
                    "results_wanted": { "type": "integer", "minimum": 1, "maximum": 200 },
                    "hours_old": { "type": "integer", "minimum": 1, "maximum": 168 },
                    "db_path": { "type": "string" },
                    "status": { "type": "string" },
                    "require_description": { "type": "boolean" },
                    "preflight_host": { "type": "string" },
                    "retry_count": { "type": "integer", "minimum": 1, "maximum": 10 },
                    "retry_sleep_seconds": { "type": "number", "minimum": 0, "maximum": 300 },
                    "retry_backoff": { "type": "number", "minimum": 1, "maximum": 10 },
                    "save_capture_json": { "type": "boolean" },
                    "capture_dir": { "type": "string" },
                    "dry_run": { "type": "boolean" }
                }
            }),
        }),
        json!({
            "name": "bulk_read_new_jobs",
            "description": "Retrieve jobs with status='new' in deterministic batches with \
                opaque cursor pagination. Read-only.",
            "inputSchema": json!({
                "type": "object",
                "properties": {
                    "limit": { "type": "integer", "minimum": 1, "maximum": 1000 },
                    "cursor": { "type": "string" },
                    "db_path": { "type": "string" }
                }
            }),
        }),
        json!({
            "name": "bulk_update_job_status",
            "description": "Update multiple job statuses in one atomic all-or-nothing \
                transaction with one shared timestamp. Returns per-item results in input order.",
            "inputSchema": json!({
                "type": "object",
                "properties": {
                    "updates": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "id": { "type": "integer" },
                                "status": { "type": "string" }
                            },
                            "required": ["id", "status"]
                        }
                    },
                    "db_path": { "type": "string" }
                },
                "required": ["updates"]
            }),
        }),
        json!({
            "name": "initialize_shortlist_trackers",
            "description": "Project shortlisted jobs into deterministic tracker markdown \
                files with stable frontmatter and linked workspace directories. Reads the \
                database only; never writes it.",
            "inputSchema": json!({
                "type": "object",
                "properties": {
                    "limit": { "type": "integer", "minimum": 1, "maximum": 200 },
                    "db_path": { "type": "string" },
                    "trackers_dir": { "type": "string" },
                    "applications_dir": { "type": "string" },
                    "force": { "type": "boolean" },
                    "dry_run": { "type": "boolean" }
                }
            }),
        }),
        json!({
            "name": "update_tracker_status",
            "description": "Update tracker frontmatter status with transition-policy checks \
                and Resume Written artifact guardrails. Tracker-only; the database is never \
                touched.",
            "inputSchema": json!({
                "type": "object",
                "properties": {
                    "tracker_path": { "type": "string" },
                    "target_status": { "type": "string" },
                    "dry_run": { "type": "boolean" },
                    "force": { "type": "boolean" }
                },
                "required": ["tracker_path", "target_status"]
            }),
        }),
        json!({
            "name": "career_tailor",
            "description": "Batch full-tailoring: parse tracker, bootstrap workspace, \
                regenerate ai_context.md, compile resume.tex to resume.pdf. Artifact-only: \
                no DB or tracker-status writes; returns successful_items for \
                finalize_resume_batch.",
            "inputSchema": json!({
                "type": "object",
                "properties": {
                    "items": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "tracker_path": { "type": "string" },
                                "job_db_id": { "type": "integer" }
                            },
                            "required": ["tracker_path"]
                        }
                    },
                    "force": { "type": "boolean" },
                    "full_resume_path": { "type": "string" },
                    "resume_template_path": { "type": "string" },
                    "applications_dir": { "type": "string" },
                    "pdflatex_cmd": { "type": "string" }
                },
                "required": ["items"]
            }),
        }),
        json!({
            "name": "finalize_resume_batch",
            "description": "Commit resume completion: validate artifacts, write DB audit \
                fields (status=resume_written), then synchronize tracker status to Resume \
                Written, with compensation fallback to reviewed when the tracker write fails \
                after the DB commit.",
            "inputSchema": json!({
                "type": "object",
                "properties": {
                    "items": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "id": { "type": "integer" },
                                "tracker_path": { "type": "string" },
                                "resume_pdf_path": { "type": "string" }
                            },
                            "required": ["id", "tracker_path"]
                        }
                    },
                    "run_id": { "type": "string" },
                    "db_path": { "type": "string" },
                    "dry_run": { "type": "boolean" }
                },
                "required": ["items"]
            }),
        }),
    ]
}
