#![forbid(unsafe_code)]

use crate::{McpServer, McpServerConfig};
use serde_json::{Value, json};

impl McpServer {
    pub(crate) fn new(config: McpServerConfig) -> Self {
        Self {
            initialized: false,
            server_name: config.server_name,
            source: config.source,
        }
    }

    pub(crate) fn handle(&mut self, request: crate::JsonRpcRequest) -> Option<Value> {
        let method = request.method.as_str();
        let expects_response = !matches!(request.id.as_ref(), None | Some(Value::Null));

        if method == "initialize" {
            // Some clients are strict about the server echoing the chosen
            // protocol version; reflect theirs back, fall back to ours.
            let protocol_version = request
                .params
                .as_ref()
                .and_then(|v| v.get("protocolVersion"))
                .and_then(|v| v.as_str())
                .unwrap_or(crate::MCP_VERSION);

            return Some(crate::json_rpc_response(
                request.id,
                json!({
                    "protocolVersion": protocol_version,
                    "serverInfo": {
                        "name": self.server_name,
                        "version": crate::SERVER_VERSION,
                    },
                    // Optional surfaces are advertised as deterministic empty
                    // stubs; some clients probe them and treat "method not
                    // found" as fatal.
                    "capabilities": {
                        "tools": {},
                        "resources": {},
                        "prompts": {},
                        "logging": {}
                    }
                }),
            ));
        }

        // The spec uses `notifications/initialized`; some clients send bare
        // `initialized`. Accept both, never respond (notification).
        if method == "notifications/initialized" || method == "initialized" {
            self.initialized = true;
            return None;
        }

        if !self.initialized {
            // Allow auto-initialization on the first real request to avoid
            // client startup races.
            if matches!(method, "tools/call" | "tools/list" | "ping") {
                self.initialized = true;
            } else if expects_response {
                return Some(crate::json_rpc_error(
                    request.id,
                    -32002,
                    "Server not initialized",
                ));
            } else {
                return None;
            }
        }

        if method == "ping" {
            return Some(crate::json_rpc_response(request.id, json!({})));
        }

        if method == "resources/list" {
            return Some(crate::json_rpc_response(
                request.id,
                json!({ "resources": [] }),
            ));
        }
        if method == "resources/templates/list" {
            return Some(crate::json_rpc_response(
                request.id,
                json!({ "resourceTemplates": [] }),
            ));
        }
        if method == "resources/read" {
            return Some(crate::json_rpc_response(
                request.id,
                json!({ "contents": [] }),
            ));
        }
        if method == "prompts/list" {
            return Some(crate::json_rpc_response(
                request.id,
                json!({ "prompts": [] }),
            ));
        }
        if method == "prompts/get" {
            return Some(crate::json_rpc_error(request.id, -32602, "Unknown prompt"));
        }
        if method == "logging/setLevel" {
            return Some(crate::json_rpc_response(request.id, json!({})));
        }
        if method == "roots/list" {
            return Some(crate::json_rpc_response(request.id, json!({ "roots": [] })));
        }

        if method == "tools/list" {
            let tools = crate::tools::tool_definitions();
            return Some(crate::json_rpc_response(
                request.id,
                json!({ "tools": tools }),
            ));
        }

        if method == "tools/call" {
            let params = match request.params {
                Some(Value::Object(map)) => map,
                _ => {
                    return Some(crate::json_rpc_error(
                        request.id,
                        -32602,
                        "params must be an object",
                    ));
                }
            };
            let tool_name = params
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();
            // Some clients send `"arguments": null` for empty-args tools;
            // treat missing/null as `{}` and let validators reject the rest.
            let args = match params.get("arguments") {
                None | Some(Value::Null) => json!({}),
                Some(v) => v.clone(),
            };
            let payload = self.call_tool(&tool_name, args);
            let is_error = crate::is_error_payload(&payload);

            return Some(crate::json_rpc_response(
                request.id,
                json!({
                    "content": [crate::tool_text_content(&payload)],
                    "isError": is_error,
                }),
            ));
        }

        // Notifications (no id / id=null) never receive a response, even for
        // unknown methods.
        if !expects_response {
            return None;
        }

        Some(crate::json_rpc_error(
            request.id,
            -32601,
            &format!("Method not found: {method}"),
        ))
    }

    pub(crate) fn call_tool(&mut self, name: &str, args: Value) -> Value {
        if !crate::tools::is_supported_tool(name) {
            return crate::validation_error(&format!("Unknown tool: {name}"));
        }

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            crate::tools::dispatch_tool(self, name, args)
        }));

        match result {
            Ok(payload) => payload,
            Err(_) => crate::tool_error(
                "INTERNAL_ERROR",
                &format!("Internal error: panic while handling {name}"),
            ),
        }
    }
}
