//! Stdio JSON-RPC server loop for the MCP front-end.
//!
//! Reads newline-delimited JSON-RPC 2.0 requests from stdin and writes one
//! response line per request to stdout. Requests are handled one at a time;
//! while idle the loop suspends on the next line. Notifications get no
//! response. Logging goes to stderr so stdout stays protocol-clean.

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;

use crate::mcp::dispatch::Dispatcher;
use crate::types::Error;

/// MCP protocol revision advertised during `initialize`.
const PROTOCOL_VERSION: &str = "2024-11-05";

/// JSON-RPC "Invalid Request" — a framing code with no application-error
/// counterpart (the request never made it far enough to produce one).
const INVALID_REQUEST: i64 = -32600;

/// Server name advertised to MCP clients.
const SERVER_NAME: &str = "fal-ai-image-editor";

/// Encode a JSON value as one response line. Logs and returns an error on
/// failure instead of silently producing an empty line.
fn encode_line(value: &Value) -> std::io::Result<Vec<u8>> {
    let mut line = serde_json::to_vec(value).map_err(|e| {
        tracing::error!("Response encoding failed: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
    })?;
    line.push(b'\n');
    Ok(line)
}

/// MCP stdio server wrapping the dispatcher.
#[derive(Debug)]
pub struct McpServer {
    dispatcher: Dispatcher,
    cancel: CancellationToken,
}

impl McpServer {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            cancel: CancellationToken::new(),
        }
    }

    /// Run the server until stdin closes or shutdown is requested.
    pub async fn serve(&self) -> std::io::Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();
        tracing::info!("MCP stdio server ready ({})", SERVER_NAME);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!("MCP server shutting down");
                    break;
                }
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        tracing::info!("stdin closed, MCP server exiting");
                        break;
                    };
                    if line.trim().is_empty() {
                        continue;
                    }
                    if let Some(response) = self.handle_line(&line).await {
                        let encoded = encode_line(&response)?;
                        stdout.write_all(&encoded).await?;
                        stdout.flush().await?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Request graceful shutdown.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Handle one incoming line. Returns `None` for notifications.
    async fn handle_line(&self, line: &str) -> Option<Value> {
        let message: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("Dropping unparseable message: {}", e);
                let err = Error::from(e);
                return Some(rpc_failure(Value::Null, &err));
            }
        };

        // Valid JSON that is not an object cannot be a request or a
        // notification; it still gets a reply rather than a silent drop.
        if !message.is_object() {
            tracing::warn!("Dropping non-object message");
            return Some(rpc_error(
                Value::Null,
                INVALID_REQUEST,
                "Invalid Request: expected a JSON object".to_string(),
            ));
        }

        let id = message.get("id").cloned();
        let method = message.get("method").and_then(Value::as_str).unwrap_or("");
        let params = message.get("params").cloned().unwrap_or(Value::Null);

        // No id means notification: consume silently.
        let Some(id) = id else {
            tracing::debug!("notification: {}", method);
            return None;
        };

        let response = match method {
            "initialize" => rpc_ok(
                id,
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": { "tools": {} },
                    "serverInfo": {
                        "name": SERVER_NAME,
                        "version": env!("CARGO_PKG_VERSION"),
                    },
                }),
            ),
            "tools/list" => rpc_ok(id, self.dispatcher.list_tools()),
            "tools/call" => rpc_ok(id, self.dispatcher.call_tool(&params).await),
            "ping" => rpc_ok(id, json!({})),
            other => rpc_failure(id, &Error::not_found(format!("Method not found: {other}"))),
        };
        Some(response)
    }
}

fn rpc_ok(id: Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

/// Error reply carrying an application error's JSON-RPC code.
fn rpc_failure(id: Value, err: &Error) -> Value {
    rpc_error(id, err.to_jsonrpc_code(), err.to_string())
}

fn rpc_error(id: Value, code: i64, message: String) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message },
    })
}

// =============================================================================
// Tests
// =============================================================================
