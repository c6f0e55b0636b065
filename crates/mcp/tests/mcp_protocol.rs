#![forbid(unsafe_code)]

mod support;

use serde_json::json;
use support::ServerClient;

#[test]
fn initialize_echoes_the_client_protocol_version() {
    let mut client = ServerClient::start("initialize_echoes_the_client_protocol_version");
    // ServerClient::start already asserted the echo; check serverInfo too.
    let response = client.request("initialize", json!({"protocolVersion": "2025-01-01"}));
    assert_eq!(response["result"]["protocolVersion"], "2025-01-01");
    assert!(
        response["result"]["serverInfo"]["name"]
            .as_str()
            .expect("server name")
            .contains("jobworkflow")
    );
}

#[test]
fn tools_list_advertises_all_seven_tools() {
    let mut client = ServerClient::start("tools_list_advertises_all_seven_tools");
    let response = client.request("tools/list", json!({}));
    let tools = response["result"]["tools"].as_array().expect("tools");
    let names: Vec<&str> = tools
        .iter()
        .map(|tool| tool["name"].as_str().expect("name"))
        .collect();
    assert_eq!(
        names,
        vec![
            "scrape_jobs",
            "bulk_read_new_jobs",
            "bulk_update_job_status",
            "initialize_shortlist_trackers",
            "update_tracker_status",
            "career_tailor",
            "finalize_resume_batch",
        ]
    );
    for tool in tools {
        assert!(tool["inputSchema"]["type"] == "object", "tool={}", tool["name"]);
    }
}

#[test]
fn optional_surfaces_answer_deterministically() {
    let mut client = ServerClient::start("optional_surfaces_answer_deterministically");
    assert_eq!(client.request("ping", json!({}))["result"], json!({}));
    assert_eq!(
        client.request("resources/list", json!({}))["result"]["resources"],
        json!([])
    );
    assert_eq!(
        client.request("prompts/list", json!({}))["result"]["prompts"],
        json!([])
    );
    assert_eq!(
        client.request("roots/list", json!({}))["result"]["roots"],
        json!([])
    );
}

#[test]
fn unknown_method_with_id_is_method_not_found() {
    let mut client = ServerClient::start("unknown_method_with_id_is_method_not_found");
    let response = client.request("no/such/method", json!({}));
    assert_eq!(response["error"]["code"], -32601);

    // An unknown notification gets no response; the next request must still
    // line up with its own id.
    client.notify("no/such/notification", json!({}));
    let response = client.request("ping", json!({}));
    assert_eq!(response["result"], json!({}));
}

#[test]
fn content_length_framing_round_trips() {
    use std::io::{BufRead, BufReader, Read, Write};
    use std::process::{Command, Stdio};

    let root = support::temp_dir("content_length_framing_round_trips");
    let mut child = Command::new(env!("CARGO_BIN_EXE_jw_mcp"))
        .env("JOBWORKFLOW_ROOT", &root)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("spawn jw_mcp");
    let mut stdin = child.stdin.take().expect("stdin");
    let mut stdout = BufReader::new(child.stdout.take().expect("stdout"));

    let body = serde_json::to_vec(&json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "initialize",
        "params": {"protocolVersion": "2024-11-05"},
    }))
    .expect("serialize");
    write!(stdin, "Content-Length: {}\r\n\r\n", body.len()).expect("write header");
    stdin.write_all(&body).expect("write body");
    stdin.flush().expect("flush");

    let mut content_length: Option<usize> = None;
    loop {
        let mut line = String::new();
        let read = stdout.read_line(&mut line).expect("read header");
        assert!(read > 0, "unexpected EOF reading response headers");
        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            break;
        }
        if let Some((key, value)) = trimmed.split_once(':')
            && key.trim().eq_ignore_ascii_case("content-length")
        {
            content_length = value.trim().parse::<usize>().ok();
        }
    }
    let len = content_length.expect("Content-Length header");
    let mut response_body = vec![0u8; len];
    stdout.read_exact(&mut response_body).expect("read body");
    let response: serde_json::Value =
        serde_json::from_slice(&response_body).expect("response JSON");
    assert_eq!(response["id"], 1);
    assert_eq!(response["result"]["protocolVersion"], "2024-11-05");

    let _ = child.kill();
    let _ = child.wait();
}

#[test]
fn unknown_tool_and_unknown_argument_are_validation_errors() {
    let mut client = ServerClient::start("unknown_tool_and_unknown_argument_are_validation_errors");
    let payload = client.call_tool("no_such_tool", json!({}));
    assert_eq!(payload["error"]["code"], "VALIDATION_ERROR");

    let payload = client.call_tool("bulk_read_new_jobs", json!({"frobnicate": 1}));
    assert_eq!(payload["error"]["code"], "VALIDATION_ERROR");
    assert!(
        payload["error"]["message"]
            .as_str()
            .expect("message")
            .contains("frobnicate")
    );
}
