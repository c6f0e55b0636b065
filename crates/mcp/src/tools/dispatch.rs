#![forbid(unsafe_code)]

use crate::McpServer;
use crate::ops;
use serde_json::Value;

pub(crate) const TOOL_NAMES: [&str; 7] = [
    "scrape_jobs",
    "bulk_read_new_jobs",
    "bulk_update_job_status",
    "initialize_shortlist_trackers",
    "update_tracker_status",
    "career_tailor",
    "finalize_resume_batch",
];

pub(crate) fn is_supported_tool(name: &str) -> bool {
    TOOL_NAMES.contains(&name)
}

pub(crate) fn dispatch_tool(server: &mut McpServer, name: &str, args: Value) -> Value {
    match name {
        "scrape_jobs" => ops::scrape::run(&args, server.source.as_ref()),
        "bulk_read_new_jobs" => ops::read_new::run(&args),
        "bulk_update_job_status" => ops::update_status::run(&args),
        "initialize_shortlist_trackers" => ops::init_trackers::run(&args),
        "update_tracker_status" => ops::tracker_status::run(&args),
        "career_tailor" => ops::tailor::run(&args),
        "finalize_resume_batch" => ops::finalize::run(&args),
        _ => crate::validation_error(&format!("Unknown tool: {name}")),
    }
}
