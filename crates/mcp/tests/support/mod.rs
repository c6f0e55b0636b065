#![forbid(unsafe_code)]
#![allow(dead_code)]

use serde_json::{Value, json};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

pub struct ServerClient {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    next_id: i64,
    pub root: PathBuf,
}

impl ServerClient {
    pub fn start(test_name: &str) -> Self {
        let root = temp_dir(test_name);
        let mut child = Command::new(env!("CARGO_BIN_EXE_jw_mcp"))
            .env("JOBWORKFLOW_ROOT", &root)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .expect("spawn jw_mcp");

        let stdin = child.stdin.take().expect("stdin");
        let stdout = BufReader::new(child.stdout.take().expect("stdout"));
        let mut client = Self {
            child,
            stdin,
            stdout,
            next_id: 1,
            root,
        };
        client.initialize();
        client
    }

    fn initialize(&mut self) {
        let response = self.request("initialize", json!({"protocolVersion": "2024-11-05"}));
        assert_eq!(response["result"]["protocolVersion"], "2024-11-05");
        self.notify("notifications/initialized", json!({}));
    }

    pub fn request(&mut self, method: &str, params: Value) -> Value {
        let id = self.next_id;
        self.next_id += 1;
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        self.send_line(&body);
        let response = self.recv_line();
        assert_eq!(response["id"], id, "response id mismatch: {response}");
        response
    }

    pub fn notify(&mut self, method: &str, params: Value) {
        let body = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
        });
        self.send_line(&body);
    }

    /// Calls a tool and returns the decoded payload from the text content.
    pub fn call_tool(&mut self, name: &str, arguments: Value) -> Value {
        let response = self.request(
            "tools/call",
            json!({"name": name, "arguments": arguments}),
        );
        let text = response["result"]["content"][0]["text"]
            .as_str()
            .expect("tool text content")
            .to_string();
        let payload: Value = serde_json::from_str(&text).expect("tool payload is JSON");
        let is_error = response["result"]["isError"].as_bool().expect("isError");
        assert_eq!(
            is_error,
            payload.get("error").is_some(),
            "isError flag disagrees with payload: {payload}"
        );
        payload
    }

    fn send_line(&mut self, body: &Value) {
        let line = serde_json::to_string(body).expect("serialize request");
        writeln!(self.stdin, "{line}").expect("write request");
        self.stdin.flush().expect("flush request");
    }

    fn recv_line(&mut self) -> Value {
        let mut line = String::new();
        let read = self.stdout.read_line(&mut line).expect("read response");
        assert!(read > 0, "unexpected EOF from server");
        serde_json::from_str(line.trim()).expect("response is JSON")
    }
}

impl Drop for ServerClient {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

pub fn temp_dir(test_name: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = base.join(format!("jw_mcp_{test_name}_{pid}_{nonce}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

pub fn seed_jobs_db(root: &PathBuf, rows: &[(i64, &str, &str)]) -> PathBuf {
    let db_dir = root.join("data/capture");
    std::fs::create_dir_all(&db_dir).expect("create db dir");
    let db_path = db_dir.join("jobs.db");
    let conn = rusqlite::Connection::open(&db_path).expect("open db");
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS jobs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            job_id TEXT,
            title TEXT,
            company TEXT,
            description TEXT,
            url TEXT UNIQUE NOT NULL,
            location TEXT,
            source TEXT,
            status TEXT NOT NULL DEFAULT 'new',
            captured_at TEXT,
            payload_json TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT,
            resume_pdf_path TEXT,
            resume_written_at TEXT,
            run_id TEXT,
            attempt_count INTEGER DEFAULT 0,
            last_error TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_jobs_status ON jobs(status);
        "#,
    )
    .expect("install schema");
    for (id, status, captured_at) in rows {
        conn.execute(
            "INSERT INTO jobs (id, job_id, title, company, description, url, location, \
             source, status, captured_at, payload_json, created_at) \
             VALUES (?1, ?2, 'Software Engineer', 'TestCo', 'Ship software.', ?3, \
                     'Toronto', 'linkedin', ?4, ?5, '{}', ?5)",
            rusqlite::params![
                id,
                format!("{id}000"),
                format!("https://example.com/job/{id}"),
                status,
                captured_at,
            ],
        )
        .expect("seed row");
    }
    db_path
}
