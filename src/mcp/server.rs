//! MCP JSON-RPC protocol handler over stdio.
//!
//! Reads JSON-RPC requests line by line, routes tool calls through the
//! [`Dispatcher`], and writes JSON-RPC responses. Implements the MCP methods
//! `initialize`, `notifications/initialized`, `ping`, `tools/list` and
//! `tools/call`.
//!
//! Every request runs in its own task; responses are written as they
//! complete, so one slow backend call does not hold up the others.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{error, info};

use super::dispatch::Dispatcher;
use super::handlers::McpToolResult;

const PROTOCOL_VERSION: &str = "2024-11-05";
const SERVER_NAME: &str = "siyuan-mcp";

// ---------------------------------------------------------------------------
// JSON-RPC message types
// ---------------------------------------------------------------------------

/// Incoming JSON-RPC request.
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

/// Outgoing JSON-RPC response.
#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: String,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

/// JSON-RPC error object.
#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

impl JsonRpcResponse {
    fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// MCP Server
// ---------------------------------------------------------------------------

/// Shared server state. Read-only while serving.
pub struct McpServerState {
    dispatcher: Dispatcher,
}

impl McpServerState {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }
}

/// Run the MCP server on stdin/stdout until stdin closes.
pub async fn run_server(dispatcher: Dispatcher) -> std::io::Result<()> {
    let state = Arc::new(McpServerState::new(dispatcher));
    let reader = tokio::io::BufReader::new(tokio::io::stdin());
    let writer = tokio::io::stdout();

    info!(
        "[MCP] SiYuan MCP server running ({} commands visible)",
        state.dispatcher.visible_commands().len()
    );
    serve(state, reader, writer).await?;
    info!("[MCP] stdin closed, shutting down");
    Ok(())
}

/// Serve JSON-RPC over any line-oriented reader/writer pair.
///
/// Returns once the reader hits EOF and every in-flight request has answered.
pub async fn serve<R, W>(state: Arc<McpServerState>, reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<JsonRpcResponse>();
    let mut lines = reader.lines();

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => dispatch_line(&state, &line, &tx),
                Ok(None) => break,
                Err(e) => {
                    error!("[MCP] Failed to read stdin: {}", e);
                    break;
                }
            },
            Some(response) = rx.recv() => write_response(&mut writer, &response).await,
        }
    }

    // Drain responses of requests still in flight
    drop(tx);
    while let Some(response) = rx.recv().await {
        write_response(&mut writer, &response).await;
    }
    Ok(())
}

/// Parse one input line and spawn its handling.
fn dispatch_line(
    state: &Arc<McpServerState>,
    line: &str,
    tx: &mpsc::UnboundedSender<JsonRpcResponse>,
) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }

    let message: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(e) => {
            let _ = tx.send(JsonRpcResponse::error(
                Value::Null,
                -32700, // Parse error
                format!("Invalid JSON: {}", e),
            ));
            return;
        }
    };
    let id = message.get("id").cloned().unwrap_or(Value::Null);
    let request: JsonRpcRequest = match serde_json::from_value(message) {
        Ok(req) => req,
        Err(e) => {
            let _ = tx.send(JsonRpcResponse::error(
                id,
                -32600, // Invalid request
                format!("Invalid request: {}", e),
            ));
            return;
        }
    };

    if request.jsonrpc != "2.0" {
        if let Some(id) = request.id {
            let _ = tx.send(JsonRpcResponse::error(id, -32600, "Invalid JSON-RPC version"));
        }
        return;
    }

    let state = Arc::clone(state);
    let tx = tx.clone();
    tokio::spawn(async move {
        let response = handle_request(&state, &request).await;
        // Notifications (no id) never get a response
        if let (Some(response), Some(_)) = (response, &request.id) {
            let _ = tx.send(response);
        }
    });
}

/// Handle a single JSON-RPC request and return a response.
async fn handle_request(state: &McpServerState, request: &JsonRpcRequest) -> Option<JsonRpcResponse> {
    let id = request.id.clone().unwrap_or(Value::Null);

    match request.method.as_str() {
        "initialize" => Some(handle_initialize(id)),
        "initialized" | "notifications/initialized" => {
            info!("[MCP] Client sent 'initialized' notification");
            None
        }
        "ping" => Some(JsonRpcResponse::success(id, json!({}))),
        "tools/list" => Some(handle_tools_list(id, state)),
        "tools/call" => Some(handle_tools_call(id, state, &request.params).await),
        "notifications/cancelled" => {
            // In-flight backend calls are not aborted
            info!("[MCP] Request cancelled: {:?}", request.params);
            None
        }
        _ => Some(JsonRpcResponse::error(
            id,
            -32601, // Method not found
            format!("Unknown method: {}", request.method),
        )),
    }
}

/// Handle `initialize` -- return server capabilities.
fn handle_initialize(id: Value) -> JsonRpcResponse {
    JsonRpcResponse::success(
        id,
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {
                    "listChanged": false
                }
            },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION")
            }
        }),
    )
}

/// Handle `tools/list` -- commands visible under the access policy.
fn handle_tools_list(id: Value, state: &McpServerState) -> JsonRpcResponse {
    let tools: Vec<Value> = state
        .dispatcher
        .visible_commands()
        .into_iter()
        .map(|d| {
            json!({
                "name": d.tool_name(),
                "description": d.description,
                "inputSchema": d.params.to_json_schema(),
            })
        })
        .collect();

    JsonRpcResponse::success(id, json!({ "tools": tools }))
}

/// Handle `tools/call` -- run the command and wrap the outcome as a tool result.
async fn handle_tools_call(id: Value, state: &McpServerState, params: &Value) -> JsonRpcResponse {
    let tool_name = params
        .get("name")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();
    let args = params.get("arguments").cloned().unwrap_or(Value::Null);

    if tool_name.is_empty() {
        return JsonRpcResponse::error(id, -32602, "Missing tool name in params");
    }

    let result = match state.dispatcher.call_tool(&tool_name, &args).await {
        Ok(value) => McpToolResult::from_value(&value),
        Err(e) => McpToolResult::from_error(&e),
    };

    match serde_json::to_value(&result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(id, -32603, format!("Failed to encode result: {}", e)),
    }
}

/// Write a JSON-RPC response (one line).
async fn write_response<W: AsyncWrite + Unpin>(writer: &mut W, response: &JsonRpcResponse) {
    match serde_json::to_string(response) {
        Ok(json) => {
            let line = format!("{}\n", json);
            if let Err(e) = writer.write_all(line.as_bytes()).await {
                error!("[MCP] Failed to write response: {}", e);
            }
            if let Err(e) = writer.flush().await {
                error!("[MCP] Failed to flush stdout: {}", e);
            }
        }
        Err(e) => {
            error!("[MCP] Failed to serialize response: {}", e);
        }
    }
}
