#![forbid(unsafe_code)]

mod entry;
mod ops;
mod server;
mod support;
mod tools;

pub(crate) use support::*;

use std::fmt::Write as _;

// Protocol negotiation baseline. We accept and echo the client's declared
// version; this constant is only the fallback when the client sends none.
const MCP_VERSION: &str = "2024-11-05";
const DEFAULT_SERVER_NAME: &str = "jobworkflow-mcp";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

fn server_name() -> String {
    std::env::var("JOBWORKFLOW_SERVER_NAME")
        .ok()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SERVER_NAME.to_string())
}

fn write_last_crash(kind: &str, detail: &str) {
    // Best-effort crash record for debugging transport issues. Never touches
    // stdout/stderr (stdout is the protocol channel) and logs no request
    // bodies.
    let dir = jw_core::paths::workflow_root().join("data/capture");
    let _ = std::fs::create_dir_all(&dir);
    let path = dir.join("jw_mcp_last_crash.txt");

    let mut out = String::new();
    let _ = writeln!(out, "ts={}", crate::support::now_iso_ms());
    let _ = writeln!(out, "pid={}", std::process::id());
    let _ = writeln!(out, "kind={kind}");
    let _ = writeln!(out, "version={SERVER_VERSION}");
    let _ = writeln!(out, "detail={detail}");
    let _ = std::fs::write(path, out);
}

fn install_crash_reporter() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let mut detail = info.to_string();
        let backtrace = std::backtrace::Backtrace::force_capture();
        let _ = write!(&mut detail, "\nbacktrace:\n{backtrace}");
        write_last_crash("panic", &detail);
        default_hook(info);
    }));
}

pub(crate) struct McpServer {
    initialized: bool,
    server_name: String,
    source: Box<dyn support::source::JobSource>,
}

pub(crate) struct McpServerConfig {
    pub(crate) server_name: String,
    pub(crate) source: Box<dyn support::source::JobSource>,
}

fn usage() -> &'static str {
    "jw_mcp — JobWorkFlow MCP server (Rust, deterministic, stdio-first)\n\n\
USAGE:\n\
  jw_mcp\n\
\n\
FLAGS:\n\
  -h, --help       Print this help and exit\n\
  -V, --version    Print version and exit\n\
\n\
ENVIRONMENT:\n\
  JOBWORKFLOW_ROOT          Repository root for relative paths (default: CWD)\n\
  JOBWORKFLOW_DB            Direct override of the jobs database path\n\
  JOBWORKFLOW_SERVER_NAME   Server identity string\n\
  JOBWORKFLOW_SCRAPER_CMD   External scraper command line (default: jobspy)\n"
}

fn version_line() -> String {
    format!("jw_mcp {SERVER_VERSION}")
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = std::env::args().collect::<Vec<_>>();
    if args
        .iter()
        .any(|arg| matches!(arg.as_str(), "-h" | "--help"))
    {
        print!("{}", usage());
        return Ok(());
    }
    if args
        .iter()
        .any(|arg| matches!(arg.as_str(), "-V" | "--version"))
    {
        println!("{}", version_line());
        return Ok(());
    }

    install_crash_reporter();

    let mut server = McpServer::new(McpServerConfig {
        server_name: server_name(),
        source: Box::new(support::source::ScraperCommand::from_env()),
    });
    let result = entry::run_stdio(&mut server);
    if let Err(err) = &result {
        write_last_crash("error", &format!("{err:?}"));
    }
    result
}
