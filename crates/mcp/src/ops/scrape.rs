#![forbid(unsafe_code)]

//! scrape_jobs: multi-term ingestion with per-term isolation.
//!
//! Pipeline per term: DNS preflight with backoff, fetch from the external
//! source, normalize, filter, optional raw-capture artifact, idempotent
//! insert. One term's failure never aborts its siblings.

use crate::support::source::{FetchRequest, JobSource};
use crate::{
    args_object, build_capture_filename, ensure_known_keys, optional_bool, optional_f64_in_range,
    optional_i64_in_range, optional_string, optional_string_list, store_error, validation_error,
    write_capture,
};
use crate::support::{
    RetryPolicy, duration_ms, format_iso_ms, generate_run_id, now_iso_ms, now_utc,
    parse_captured_at, preflight_dns,
};
use jw_core::sanitize::sanitize_error_message;
use jw_core::status::JobStatus;
use jw_storage::{CleanJobRecord, JobsStore, resolve_db_path};
use serde_json::{Value, json};

const ALLOWED_KEYS: [&str; 15] = [
    "terms",
    "location",
    "sites",
    "results_wanted",
    "hours_old",
    "db_path",
    "status",
    "require_description",
    "preflight_host",
    "retry_count",
    "retry_sleep_seconds",
    "retry_backoff",
    "save_capture_json",
    "capture_dir",
    "dry_run",
];

const DEFAULT_TERMS: [&str; 3] = ["ai engineer", "backend engineer", "machine learning"];
const DEFAULT_LOCATION: &str = "Ontario, Canada";
const DEFAULT_SITES: [&str; 1] = ["linkedin"];
const DEFAULT_RESULTS_WANTED: i64 = 20;
const DEFAULT_HOURS_OLD: i64 = 2;
const DEFAULT_PREFLIGHT_HOST: &str = "www.linkedin.com";
const DEFAULT_RETRY_COUNT: i64 = 3;
const DEFAULT_RETRY_SLEEP_SECONDS: f64 = 30.0;
const DEFAULT_RETRY_BACKOFF: f64 = 2.0;
const DEFAULT_CAPTURE_DIR: &str = "data/capture";

struct ScrapeOptions {
    terms: Vec<String>,
    location: String,
    sites: Vec<String>,
    results_wanted: i64,
    hours_old: i64,
    status: JobStatus,
    require_description: bool,
    preflight_host: String,
    retry: RetryPolicy,
    save_capture_json: bool,
    capture_dir: String,
    dry_run: bool,
}

#[derive(Default)]
struct TermOutcome {
    success: bool,
    fetched_count: usize,
    cleaned_count: usize,
    inserted_count: usize,
    duplicate_count: usize,
    skipped_no_url: usize,
    skipped_no_description: usize,
    capture_path: Option<String>,
    error: Option<String>,
}

pub(crate) fn run(args: &Value, source: &dyn JobSource) -> Value {
    match execute(args, source) {
        Ok(payload) | Err(payload) => payload,
    }
}

fn execute(args: &Value, source: &dyn JobSource) -> Result<Value, Value> {
    let args = args_object(args)?;
    ensure_known_keys(args, &ALLOWED_KEYS)?;
    let opts = parse_options(args)?;

    let started = now_utc();
    let run_id = generate_run_id("scrape");

    let db_path = resolve_db_path(optional_string(args, "db_path")?.as_deref());
    let mut store = if opts.dry_run {
        None
    } else {
        Some(JobsStore::open_or_create(&db_path).map_err(store_error)?)
    };

    let mut results: Vec<Value> = Vec::with_capacity(opts.terms.len());
    let mut totals = TermOutcome::default();
    let mut successful_terms = 0usize;
    let mut failed_terms = 0usize;

    for term in &opts.terms {
        let outcome = run_term(term, &opts, source, store.as_mut());
        if outcome.success {
            successful_terms += 1;
        } else {
            failed_terms += 1;
        }
        totals.fetched_count += outcome.fetched_count;
        totals.cleaned_count += outcome.cleaned_count;
        totals.inserted_count += outcome.inserted_count;
        totals.duplicate_count += outcome.duplicate_count;
        totals.skipped_no_url += outcome.skipped_no_url;
        totals.skipped_no_description += outcome.skipped_no_description;
        results.push(term_result_json(term, outcome));
    }

    let finished = now_utc();
    Ok(json!({
        "run_id": run_id,
        "started_at": format_iso_ms(started),
        "finished_at": format_iso_ms(finished),
        "duration_ms": duration_ms(started, finished),
        "dry_run": opts.dry_run,
        "results": results,
        "totals": {
            "term_count": opts.terms.len(),
            "successful_terms": successful_terms,
            "failed_terms": failed_terms,
            "fetched_count": totals.fetched_count,
            "cleaned_count": totals.cleaned_count,
            "inserted_count": totals.inserted_count,
            "duplicate_count": totals.duplicate_count,
            "skipped_no_url": totals.skipped_no_url,
            "skipped_no_description": totals.skipped_no_description,
        },
    }))
}

fn parse_options(args: &serde_json::Map<String, Value>) -> Result<ScrapeOptions, Value> {
    let terms = optional_string_list(args, "terms")?
        .unwrap_or_else(|| DEFAULT_TERMS.iter().map(|t| t.to_string()).collect());
    let sites = optional_string_list(args, "sites")?
        .unwrap_or_else(|| DEFAULT_SITES.iter().map(|s| s.to_string()).collect());
    let status = match optional_string(args, "status")? {
        Some(raw) => JobStatus::parse(&raw).ok_or_else(|| {
            validation_error(&format!(
                "status must be one of {}",
                JobStatus::allowed_values()
            ))
        })?,
        None => JobStatus::New,
    };

    Ok(ScrapeOptions {
        terms,
        location: optional_string(args, "location")?
            .unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
        sites,
        results_wanted: optional_i64_in_range(args, "results_wanted", 1, 200)?
            .unwrap_or(DEFAULT_RESULTS_WANTED),
        hours_old: optional_i64_in_range(args, "hours_old", 1, 168)?.unwrap_or(DEFAULT_HOURS_OLD),
        status,
        require_description: optional_bool(args, "require_description")?.unwrap_or(true),
        preflight_host: optional_string(args, "preflight_host")?
            .unwrap_or_else(|| DEFAULT_PREFLIGHT_HOST.to_string()),
        retry: RetryPolicy {
            count: optional_i64_in_range(args, "retry_count", 1, 10)?
                .unwrap_or(DEFAULT_RETRY_COUNT),
            sleep_seconds: optional_f64_in_range(args, "retry_sleep_seconds", 0.0, 300.0)?
                .unwrap_or(DEFAULT_RETRY_SLEEP_SECONDS),
            backoff: optional_f64_in_range(args, "retry_backoff", 1.0, 10.0)?
                .unwrap_or(DEFAULT_RETRY_BACKOFF),
        },
        save_capture_json: optional_bool(args, "save_capture_json")?.unwrap_or(true),
        capture_dir: optional_string(args, "capture_dir")?
            .unwrap_or_else(|| DEFAULT_CAPTURE_DIR.to_string()),
        dry_run: optional_bool(args, "dry_run")?.unwrap_or(false),
    })
}

fn run_term(
    term: &str,
    opts: &ScrapeOptions,
    source: &dyn JobSource,
    store: Option<&mut JobsStore>,
) -> TermOutcome {
    if let Err(err) = preflight_dns(&opts.preflight_host, &opts.retry) {
        return TermOutcome {
            error: Some(sanitize_error_message(&err)),
            ..TermOutcome::default()
        };
    }

    let request = FetchRequest {
        term: term.to_string(),
        location: opts.location.clone(),
        sites: opts.sites.clone(),
        results_wanted: opts.results_wanted,
        hours_old: opts.hours_old,
    };
    let raw = match source.fetch(&request) {
        Ok(records) => records,
        Err(err) => {
            return TermOutcome {
                error: Some(sanitize_error_message(&err)),
                ..TermOutcome::default()
            };
        }
    };

    let mut outcome = TermOutcome {
        fetched_count: raw.len(),
        ..TermOutcome::default()
    };

    let mut cleaned: Vec<CleanJobRecord> = Vec::with_capacity(raw.len());
    for record in &raw {
        let normalized = normalize_record(record, &opts.sites);
        if normalized.url.is_empty() {
            outcome.skipped_no_url += 1;
            continue;
        }
        if opts.require_description && normalized.description.is_empty() {
            outcome.skipped_no_description += 1;
            continue;
        }
        cleaned.push(normalized);
    }
    outcome.cleaned_count = cleaned.len();

    // Capture failures are non-fatal; the path is simply absent.
    if opts.save_capture_json {
        let filename = build_capture_filename(term, &opts.location, opts.hours_old, &opts.sites);
        if let Ok(path) = write_capture(&opts.capture_dir, &filename, &raw) {
            outcome.capture_path = Some(path.to_string_lossy().to_string());
        }
    }

    if let Some(store) = store {
        match store.insert_cleaned(&cleaned, opts.status, &now_iso_ms()) {
            Ok(counts) => {
                outcome.inserted_count = counts.inserted;
                outcome.duplicate_count = counts.duplicates;
            }
            Err(err) => {
                outcome.error = Some(sanitize_error_message(&err.to_string()));
                return outcome;
            }
        }
    }

    outcome.success = true;
    outcome
}

fn normalize_record(raw: &Value, sites: &[String]) -> CleanJobRecord {
    let url = string_field(raw, "job_url")
        .filter(|u| !u.is_empty())
        .or_else(|| string_field(raw, "job_url_direct"))
        .unwrap_or_default();

    let job_id = linkedin_job_id(&url)
        .or_else(|| string_field(raw, "id"))
        .unwrap_or_default();

    let source = sites
        .first()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| string_field(raw, "site"))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string());

    let captured_at = string_field(raw, "date_posted")
        .and_then(|posted| parse_captured_at(&posted))
        .unwrap_or_else(now_iso_ms);

    CleanJobRecord {
        job_id,
        title: string_field(raw, "title").unwrap_or_default(),
        company: string_field(raw, "company").unwrap_or_default(),
        description: string_field(raw, "description").unwrap_or_default(),
        url,
        location: string_field(raw, "location").unwrap_or_default(),
        source,
        captured_at,
        payload_json: raw.to_string(),
    }
}

fn string_field(raw: &Value, key: &str) -> Option<String> {
    match raw.get(key) {
        Some(Value::String(s)) => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// LinkedIn-style job id: the digit run following `/jobs/view/`.
fn linkedin_job_id(url: &str) -> Option<String> {
    let rest = &url[url.find("/jobs/view/")? + "/jobs/view/".len()..];
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    (!digits.is_empty()).then_some(digits)
}

fn term_result_json(term: &str, outcome: TermOutcome) -> Value {
    let mut obj = serde_json::Map::new();
    obj.insert("term".to_string(), json!(term));
    obj.insert("success".to_string(), json!(outcome.success));
    obj.insert("fetched_count".to_string(), json!(outcome.fetched_count));
    obj.insert("cleaned_count".to_string(), json!(outcome.cleaned_count));
    obj.insert("inserted_count".to_string(), json!(outcome.inserted_count));
    obj.insert(
        "duplicate_count".to_string(),
        json!(outcome.duplicate_count),
    );
    obj.insert("skipped_no_url".to_string(), json!(outcome.skipped_no_url));
    obj.insert(
        "skipped_no_description".to_string(),
        json!(outcome.skipped_no_description),
    );
    if let Some(path) = outcome.capture_path {
        obj.insert("capture_path".to_string(), json!(path));
    }
    if let Some(error) = outcome.error {
        obj.insert("error".to_string(), json!(error));
    }
    Value::Object(obj)
}
