// crates/repo-gate-mcp/src/server.rs
// ============================================================================
// Module: Gateway Server
// Description: Stdio JSON-RPC server for the tool gateway.
// Purpose: Expose tools/list and tools/call over Content-Length framing.
// Dependencies: rand, repo-gate-config, repo-gate-core, serde, tokio
// ============================================================================

//! ## Overview
//! The server speaks JSON-RPC 2.0 over stdin/stdout with `Content-Length`
//! framing. `tools/call` always resolves to a result carrying the gateway's
//! two-shape envelope, even for denied or failed calls; JSON-RPC errors are
//! reserved for protocol problems (bad version, unknown method, malformed
//! params). Stdout is reserved for the protocol; all logging goes elsewhere.
//! Security posture: request bodies are bounded before parsing and every
//! request is tagged with a server-generated correlation identifier.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use repo_gate_config::GatewayConfig;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncRead;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;

use crate::audit::AuditSink;
use crate::dispatch::ToolDispatcher;
use crate::tools::ToolDefinition;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum accepted request body size (4 MiB).
pub const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Maximum accepted total header size per frame (8 KiB).
pub const MAX_HEADER_BYTES: usize = 8 * 1024;

// ============================================================================
// SECTION: Server
// ============================================================================

/// Gateway server instance.
pub struct GatewayServer {
    /// Tool dispatcher for request handling.
    dispatcher: ToolDispatcher,
}

impl GatewayServer {
    /// Builds a server from the loaded configuration and an audit sink.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Init`] when the dispatcher cannot be built.
    pub fn from_config(
        config: &GatewayConfig,
        audit: Arc<dyn AuditSink>,
    ) -> Result<Self, ServerError> {
        let dispatcher = ToolDispatcher::from_config(config, audit)
            .map_err(|err| ServerError::Init(err.to_string()))?;
        Ok(Self {
            dispatcher,
        })
    }

    /// Serves framed JSON-RPC requests over stdin/stdout until EOF.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Transport`] on unrecoverable stream failures.
    pub async fn serve_stdio(&self) -> Result<(), ServerError> {
        let mut reader = BufReader::new(tokio::io::stdin());
        let mut writer = tokio::io::stdout();
        loop {
            let bytes = match read_framed(&mut reader, MAX_BODY_BYTES).await {
                Ok(bytes) => bytes,
                Err(ServerError::Closed) => return Ok(()),
                Err(err) => return Err(err),
            };
            let response = match serde_json::from_slice::<JsonRpcRequest>(&bytes) {
                Ok(request) => self.handle_request(request).await,
                Err(_) => protocol_error(Value::Null, -32600, "invalid json-rpc request"),
            };
            let payload = serde_json::to_vec(&response)
                .map_err(|_| ServerError::Transport("json-rpc serialization failed".to_string()))?;
            write_framed(&mut writer, &payload).await?;
        }
    }

    /// Handles one parsed JSON-RPC request.
    async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        if request.jsonrpc != "2.0" {
            return protocol_error(request.id, -32600, "invalid json-rpc version");
        }
        match request.method.as_str() {
            "tools/list" => {
                let tools = self.dispatcher.list_tools();
                match serde_json::to_value(ToolListResult {
                    tools,
                }) {
                    Ok(value) => rpc_result(request.id, value),
                    Err(_) => protocol_error(request.id, -32060, "serialization failed"),
                }
            }
            "tools/call" => {
                let params = request.params.unwrap_or(Value::Null);
                let Ok(call) = serde_json::from_value::<ToolCallParams>(params) else {
                    return protocol_error(request.id, -32602, "invalid tool params");
                };
                let correlation_id = correlation_id();
                let envelope = self
                    .dispatcher
                    .dispatch(
                        &correlation_id,
                        call.authorization.as_deref(),
                        &call.name,
                        call.arguments,
                    )
                    .await;
                match serde_json::to_value(&envelope) {
                    Ok(value) => rpc_result(request.id, value),
                    Err(_) => protocol_error(request.id, -32060, "serialization failed"),
                }
            }
            _ => protocol_error(request.id, -32601, "method not found"),
        }
    }
}

/// Generates a server-side correlation identifier for one request.
fn correlation_id() -> String {
    format!("{:016x}", rand::random::<u64>())
}

// ============================================================================
// SECTION: JSON-RPC Types
// ============================================================================

/// Incoming JSON-RPC request payload.
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    /// JSON-RPC protocol version.
    jsonrpc: String,
    /// Request identifier.
    id: Value,
    /// Method name.
    method: String,
    /// Optional parameters payload.
    params: Option<Value>,
}

/// JSON-RPC response envelope.
#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    /// JSON-RPC protocol version.
    jsonrpc: &'static str,
    /// Request identifier.
    id: Value,
    /// Successful result payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    /// Error payload when the request fails at the protocol level.
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

/// JSON-RPC protocol error payload.
#[derive(Debug, Serialize)]
struct JsonRpcError {
    /// Error code.
    code: i64,
    /// Human-readable error message.
    message: String,
}

/// Tool call parameters for `tools/call`.
#[derive(Debug, Deserialize)]
struct ToolCallParams {
    /// Tool name.
    name: String,
    /// Raw JSON arguments.
    arguments: Value,
    /// Optional bearer credential for tenant-aware deployments.
    #[serde(default)]
    authorization: Option<String>,
}

/// Tool list response payload.
#[derive(Debug, Serialize)]
struct ToolListResult {
    /// Registered tool definitions.
    tools: Vec<ToolDefinition>,
}

/// Builds a successful JSON-RPC response.
fn rpc_result(id: Value, value: Value) -> JsonRpcResponse {
    JsonRpcResponse {
        jsonrpc: "2.0",
        id,
        result: Some(value),
        error: None,
    }
}

/// Builds a protocol-level JSON-RPC error response.
fn protocol_error(id: Value, code: i64, message: &str) -> JsonRpcResponse {
    JsonRpcResponse {
        jsonrpc: "2.0",
        id,
        result: None,
        error: Some(JsonRpcError {
            code,
            message: message.to_string(),
        }),
    }
}

// ============================================================================
// SECTION: Framing Helpers
// ============================================================================

/// Reads a framed payload using `Content-Length` headers.
///
/// Header bytes are bounded by [`MAX_HEADER_BYTES`] across the whole header
/// block, so a newline-free stream cannot grow the line buffer without limit.
async fn read_framed(
    reader: &mut BufReader<impl AsyncRead + Unpin>,
    max_body_bytes: usize,
) -> Result<Vec<u8>, ServerError> {
    let mut content_length: Option<usize> = None;
    let mut line = String::new();
    let mut header_bytes: usize = 0;
    loop {
        line.clear();
        let remaining = MAX_HEADER_BYTES - header_bytes;
        if remaining == 0 {
            return Err(ServerError::Transport("header too large".to_string()));
        }
        let mut limited = (&mut *reader).take(u64::try_from(remaining).unwrap_or(u64::MAX));
        let bytes = limited
            .read_line(&mut line)
            .await
            .map_err(|_| ServerError::Transport("stdio read failed".to_string()))?;
        if bytes == 0 {
            return Err(ServerError::Closed);
        }
        header_bytes += bytes;
        if bytes == remaining && !line.ends_with('\n') {
            return Err(ServerError::Transport("header too large".to_string()));
        }
        if line.trim().is_empty() {
            break;
        }
        if let Some(value) = line.strip_prefix("Content-Length:") {
            let parsed = value
                .trim()
                .parse::<usize>()
                .map_err(|_| ServerError::Transport("invalid content length".to_string()))?;
            content_length = Some(parsed);
        }
    }
    let len = content_length
        .ok_or_else(|| ServerError::Transport("missing content length".to_string()))?;
    if len > max_body_bytes {
        return Err(ServerError::Transport("payload too large".to_string()));
    }
    let mut buf = vec![0u8; len];
    reader
        .read_exact(&mut buf)
        .await
        .map_err(|_| ServerError::Transport("stdio read failed".to_string()))?;
    Ok(buf)
}

/// Writes a framed payload using `Content-Length` headers.
async fn write_framed(
    writer: &mut (impl AsyncWrite + Unpin),
    payload: &[u8],
) -> Result<(), ServerError> {
    let header = format!("Content-Length: {}\r\n\r\n", payload.len());
    writer
        .write_all(header.as_bytes())
        .await
        .map_err(|_| ServerError::Transport("stdio write failed".to_string()))?;
    writer
        .write_all(payload)
        .await
        .map_err(|_| ServerError::Transport("stdio write failed".to_string()))?;
    writer
        .flush()
        .await
        .map_err(|_| ServerError::Transport("stdio write failed".to_string()))
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Gateway server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Initialization failed.
    #[error("init error: {0}")]
    Init(String),
    /// The transport stream failed.
    #[error("transport error: {0}")]
    Transport(String),
    /// The input stream reached EOF; a clean shutdown, not a failure.
    #[error("stdio closed")]
    Closed,
}

// ============================================================================
// SECTION: Tests
// ============================================================================
