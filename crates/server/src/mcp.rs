//! MCP tool server over stdio
//!
//! Line-delimited JSON-RPC 2.0. Publishes the four accessors as tools.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use llama_core::Accessor;
use llama_feed::DataSource;

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "defillama-mcp";

const PARSE_ERROR: i32 = -32700;
const INVALID_REQUEST: i32 = -32600;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;

#[derive(Debug, Error)]
pub enum McpError {
    #[error("stdio transport error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode response: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

impl JsonRpcResponse {
    fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn failure(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// Serves `tools/list` and `tools/call` against a data source
pub struct ToolServer {
    source: Arc<dyn DataSource>,
}

impl ToolServer {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self { source }
    }

    /// Serve on the process's stdin/stdout until stdin closes
    pub async fn serve_stdio(&self) -> Result<(), McpError> {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        self.serve(stdin, tokio::io::stdout()).await
    }

    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<(), McpError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("MCP tool server ready");
        let mut lines = reader.lines();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            if let Some(response) = self.handle_line(&line).await {
                let mut out = serde_json::to_vec(&response)?;
                out.push(b'\n');
                writer.write_all(&out).await?;
                writer.flush().await?;
            }
        }

        info!("stdin closed, MCP tool server stopping");
        Ok(())
    }

    /// Handle one JSON-RPC message. Notifications produce no response.
    pub async fn handle_line(&self, line: &str) -> Option<Value> {
        let message: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "unparseable JSON-RPC message");
                let response = JsonRpcResponse::failure(Value::Null, PARSE_ERROR, e.to_string());
                return serde_json::to_value(response).ok();
            }
        };

        // A present `"id": null` still expects a reply; only a missing id is a notification
        let id = message.get("id").cloned();
        let request: JsonRpcRequest = match serde_json::from_value(message) {
            Ok(r) => r,
            Err(e) => {
                let id = id.unwrap_or(Value::Null);
                let response = JsonRpcResponse::failure(id, INVALID_REQUEST, e.to_string());
                return serde_json::to_value(response).ok();
            }
        };

        let id = id?;
        let response = self.dispatch(id, request).await;
        serde_json::to_value(response).ok()
    }

    async fn dispatch(&self, id: Value, request: JsonRpcRequest) -> JsonRpcResponse {
        debug!(method = %request.method, "JSON-RPC request");

        if request.jsonrpc != "2.0" {
            return JsonRpcResponse::failure(id, INVALID_REQUEST, "jsonrpc must be \"2.0\"");
        }

        match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(id, initialize_result()),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => JsonRpcResponse::success(id, json!({ "tools": tool_list() })),
            "tools/call" => match self.call_tool(&request.params).await {
                Ok(result) => JsonRpcResponse::success(id, result),
                Err(message) => JsonRpcResponse::failure(id, INVALID_PARAMS, message),
            },
            other => JsonRpcResponse::failure(id, METHOD_NOT_FOUND, format!("Method not found: {other}")),
        }
    }

    async fn call_tool(&self, params: &Value) -> Result<Value, String> {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| "missing tool name".to_string())?;
        let accessor =
            Accessor::from_tool_name(name).ok_or_else(|| format!("Unknown tool: {name}"))?;

        let identifier = match accessor.parameter() {
            Some((param, _)) => params
                .get("arguments")
                .and_then(|args| args.get(param))
                .and_then(Value::as_str)
                .ok_or_else(|| format!("{name}: missing string argument '{param}'"))?,
            None => "",
        };

        let result = match self.source.invoke(accessor, identifier).await {
            Ok(value) => tool_result(value.unwrap_or(Value::Null).to_string(), false),
            Err(e) => {
                warn!(tool = name, error = %e, "tool call fault");
                tool_result(e.to_string(), true)
            }
        };
        Ok(result)
    }
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": { "tools": {} },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION"),
        },
    })
}

fn tool_list() -> Vec<Value> {
    Accessor::ALL
        .iter()
        .map(|a| {
            json!({
                "name": a.tool_name(),
                "description": a.description(),
                "inputSchema": a.input_schema(),
            })
        })
        .collect()
}

fn tool_result(text: String, is_error: bool) -> Value {
    json!({
        "content": [{ "type": "text", "text": text }],
        "isError": is_error,
    })
}
