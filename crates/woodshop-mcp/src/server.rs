// crates/woodshop-mcp/src/server.rs
// ============================================================================
// Module: MCP Server
// Description: MCP server implementations for stdio and HTTP transports.
// Purpose: Expose Woodshop tools via JSON-RPC 2.0.
// Dependencies: axum, serde, serde_json, tokio, woodshop-config
// ============================================================================

//! ## Overview
//! The server speaks JSON-RPC 2.0 over newline-delimited stdio or HTTP
//! `POST /rpc`, and always routes calls through [`ToolRouter`]. Protocol
//! failures (bad JSON, unknown method, bad params) are JSON-RPC errors; tool
//! failures never are: `tools/call` always answers with the tool envelope.
//! Requests without an `id` are notifications and get no reply.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::post;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use tokio::io::AsyncBufRead;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;
use tokio::net::TcpListener;
use woodshop_config::ServerTransport;
use woodshop_config::WoodshopConfig;

use crate::logging::notice;
use crate::logging::observer_from_config;
use crate::manifest::SERVER_NAME;
use crate::manifest::SERVER_VERSION;
use crate::metadata;
use crate::router::ToolRouter;
use crate::tools::builtin_catalog;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// MCP protocol revision reported by `initialize`.
pub const PROTOCOL_VERSION: &str = "2025-06-18";
/// JSON-RPC parse error.
pub const PARSE_ERROR: i64 = -32700;
/// JSON-RPC invalid request.
pub const INVALID_REQUEST: i64 = -32600;
/// JSON-RPC method not found.
pub const METHOD_NOT_FOUND: i64 = -32601;
/// JSON-RPC invalid params.
pub const INVALID_PARAMS: i64 = -32602;
/// JSON-RPC internal error.
pub const INTERNAL_ERROR: i64 = -32603;

// ============================================================================
// SECTION: MCP Server
// ============================================================================

/// MCP server instance.
pub struct McpServer {
    /// Server configuration.
    config: WoodshopConfig,
    /// Tool router for request dispatch.
    router: ToolRouter,
}

impl McpServer {
    /// Builds a new MCP server from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerError`] when initialization fails.
    pub fn from_config(mut config: WoodshopConfig) -> Result<Self, McpServerError> {
        config.validate().map_err(|err| McpServerError::Config(err.to_string()))?;
        let metadata = metadata::discover(&config.provenance).shared();
        let observer = observer_from_config(&config.logging)?;
        let catalog = builtin_catalog(&metadata, &observer)
            .map_err(|err| McpServerError::Init(err.to_string()))?;
        Ok(Self {
            config,
            router: ToolRouter::new(catalog),
        })
    }

    /// Returns the tool router.
    #[must_use]
    pub const fn router(&self) -> &ToolRouter {
        &self.router
    }

    /// Serves requests using the configured transport.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerError`] when the server fails.
    pub async fn serve(self) -> Result<(), McpServerError> {
        let max_body_bytes = self.config.server.max_body_bytes;
        match self.config.server.transport {
            ServerTransport::Stdio => {
                notice("info", "transport_started", transport_fields("stdio", None));
                let reader = BufReader::new(tokio::io::stdin());
                serve_lines(&self.router, reader, tokio::io::stdout(), max_body_bytes).await
            }
            ServerTransport::Http => {
                let addr = self
                    .config
                    .server
                    .bind_addr()
                    .ok_or_else(|| McpServerError::Config("invalid bind address".to_string()))?;
                let listener = TcpListener::bind(addr)
                    .await
                    .map_err(|err| McpServerError::Transport(format!("http bind failed: {err}")))?;
                serve_http(listener, self.router, max_body_bytes).await
            }
        }
    }
}

/// Fields for the `transport_started` notice.
fn transport_fields(transport: &str, addr: Option<SocketAddr>) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("transport".to_string(), Value::from(transport));
    if let Some(addr) = addr {
        fields.insert("bind".to_string(), Value::from(addr.to_string()));
    }
    fields
}

// ============================================================================
// SECTION: Stdio Transport
// ============================================================================

/// Serves newline-delimited JSON-RPC until the reader closes.
///
/// At most `max_body_bytes + 1` bytes of a line are buffered. A longer line
/// is discarded through its newline and answered with the oversized error.
///
/// # Errors
///
/// Returns [`McpServerError::Transport`] when reading or writing fails.
pub async fn serve_lines<R, W>(
    router: &ToolRouter,
    mut reader: R,
    mut writer: W,
    max_body_bytes: usize,
) -> Result<(), McpServerError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let read_limit = u64::try_from(max_body_bytes).unwrap_or(u64::MAX).saturating_add(1);
    let mut buffer = Vec::new();
    loop {
        buffer.clear();
        let read = (&mut reader)
            .take(read_limit)
            .read_until(b'\n', &mut buffer)
            .await
            .map_err(|_| McpServerError::Transport("stdio read failed".to_string()))?;
        if read == 0 {
            return Ok(());
        }
        if buffer.len() > max_body_bytes && buffer.last() != Some(&b'\n') {
            discard_line(&mut reader).await?;
            write_line(&mut writer, &oversized_response()).await?;
            continue;
        }
        let line = buffer.trim_ascii();
        if line.is_empty() {
            continue;
        }
        let Some((_, response)) = handle_message(router, line, max_body_bytes).await else {
            continue;
        };
        write_line(&mut writer, &response).await?;
    }
}

/// Skips input through the next newline or end of stream.
async fn discard_line<R>(reader: &mut R) -> Result<(), McpServerError>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let (consumed, done) = {
            let available = reader
                .fill_buf()
                .await
                .map_err(|_| McpServerError::Transport("stdio read failed".to_string()))?;
            match available.iter().position(|byte| *byte == b'\n') {
                Some(newline) => (newline + 1, true),
                None => (available.len(), available.is_empty()),
            }
        };
        reader.consume(consumed);
        if done {
            return Ok(());
        }
    }
}

/// Writes one response followed by a newline and flushes.
async fn write_line<W>(writer: &mut W, response: &JsonRpcResponse) -> Result<(), McpServerError>
where
    W: AsyncWrite + Unpin,
{
    let mut payload = serde_json::to_vec(response)
        .map_err(|_| McpServerError::Transport("json-rpc serialization failed".to_string()))?;
    payload.push(b'\n');
    writer
        .write_all(&payload)
        .await
        .map_err(|_| McpServerError::Transport("stdio write failed".to_string()))?;
    writer.flush().await.map_err(|_| McpServerError::Transport("stdio write failed".to_string()))
}

// ============================================================================
// SECTION: HTTP Transport
// ============================================================================

/// Shared server state for HTTP handlers.
struct ServerState {
    /// Tool router for request dispatch.
    router: ToolRouter,
    /// Maximum allowed request body size.
    max_body_bytes: usize,
}

/// Builds the HTTP application.
#[must_use]
pub fn http_app(router: ToolRouter, max_body_bytes: usize) -> Router {
    let state = Arc::new(ServerState {
        router,
        max_body_bytes,
    });
    Router::new()
        .route("/rpc", post(handle_http))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}

/// Serves JSON-RPC over HTTP on a bound listener.
///
/// # Errors
///
/// Returns [`McpServerError::Transport`] when the server fails.
pub async fn serve_http(
    listener: TcpListener,
    router: ToolRouter,
    max_body_bytes: usize,
) -> Result<(), McpServerError> {
    let addr = listener.local_addr().ok();
    notice("info", "transport_started", transport_fields("http", addr));
    axum::serve(listener, http_app(router, max_body_bytes))
        .await
        .map_err(|err| McpServerError::Transport(format!("http server failed: {err}")))
}

/// Handles HTTP JSON-RPC requests.
async fn handle_http(
    State(state): State<Arc<ServerState>>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let bytes = match body {
        Ok(bytes) => bytes,
        Err(rejection) => {
            let response =
                JsonRpcResponse::error(Value::Null, INVALID_REQUEST, "request body rejected");
            return (rejection.status(), Json(response)).into_response();
        }
    };
    match handle_message(&state.router, &bytes, state.max_body_bytes).await {
        Some((status, response)) => (status, Json(response)).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

// ============================================================================
// SECTION: JSON-RPC Handling
// ============================================================================

/// Incoming JSON-RPC request payload.
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    /// JSON-RPC protocol version.
    jsonrpc: String,
    /// Request identifier.
    #[serde(default)]
    id: Value,
    /// Method name.
    method: String,
    /// Optional parameters payload.
    #[serde(default)]
    params: Option<Value>,
}

/// JSON-RPC response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC protocol version.
    pub jsonrpc: String,
    /// Request identifier.
    pub id: Value,
    /// Successful result payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error payload when the request fails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Builds a success response.
    fn result(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Builds an error response.
    fn error(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// JSON-RPC error payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code.
    pub code: i64,
    /// Human-readable error message.
    pub message: String,
}

/// Tool call parameters.
#[derive(Debug, Deserialize)]
struct ToolCallParams {
    /// Tool name.
    name: String,
    /// Raw arguments; absent means `{}`.
    #[serde(default)]
    arguments: Value,
}

/// Parses one request body and dispatches it.
///
/// Returns `None` for notifications.
pub async fn handle_message(
    router: &ToolRouter,
    bytes: &[u8],
    max_body_bytes: usize,
) -> Option<(StatusCode, JsonRpcResponse)> {
    if bytes.len() > max_body_bytes {
        return Some((StatusCode::PAYLOAD_TOO_LARGE, oversized_response()));
    }
    let Ok(value) = serde_json::from_slice::<Value>(bytes) else {
        return Some((
            StatusCode::BAD_REQUEST,
            JsonRpcResponse::error(Value::Null, PARSE_ERROR, "parse error"),
        ));
    };
    let Some(object) = value.as_object() else {
        return Some((
            StatusCode::BAD_REQUEST,
            JsonRpcResponse::error(Value::Null, INVALID_REQUEST, "invalid json-rpc request"),
        ));
    };
    let is_notification = !object.contains_key("id");
    let id = object.get("id").cloned().unwrap_or(Value::Null);
    let Ok(request) = serde_json::from_value::<JsonRpcRequest>(value) else {
        return Some((
            StatusCode::BAD_REQUEST,
            JsonRpcResponse::error(id, INVALID_REQUEST, "invalid json-rpc request"),
        ));
    };
    let response = handle_request(router, request).await;
    (!is_notification).then_some(response)
}

/// Error answer for a request over the size limit.
fn oversized_response() -> JsonRpcResponse {
    JsonRpcResponse::error(Value::Null, INVALID_REQUEST, "request body too large")
}

/// Dispatches a parsed JSON-RPC request.
async fn handle_request(
    router: &ToolRouter,
    request: JsonRpcRequest,
) -> (StatusCode, JsonRpcResponse) {
    let id = request.id;
    if request.jsonrpc != "2.0" {
        return (
            StatusCode::BAD_REQUEST,
            JsonRpcResponse::error(id, INVALID_REQUEST, "invalid json-rpc version"),
        );
    }
    let result = match request.method.as_str() {
        "initialize" => Ok(json!({
            "protocolVersion": PROTOCOL_VERSION,
            "serverInfo": {"name": SERVER_NAME, "version": SERVER_VERSION},
            "capabilities": {"tools": {"listChanged": false}},
        })),
        "ping" => Ok(json!({})),
        "tools/list" => {
            serde_json::to_value(router.list_tools()).map(|tools| json!({"tools": tools}))
        }
        "tools/call" => {
            let params = request.params.unwrap_or(Value::Null);
            let Ok(call) = serde_json::from_value::<ToolCallParams>(params) else {
                return (
                    StatusCode::BAD_REQUEST,
                    JsonRpcResponse::error(id, INVALID_PARAMS, "invalid tool params"),
                );
            };
            match router.call_tool(&call.name, call.arguments).await {
                Ok(result) => serde_json::to_value(result),
                Err(err) => {
                    return (
                        StatusCode::BAD_REQUEST,
                        JsonRpcResponse::error(id, INVALID_PARAMS, err.to_string()),
                    );
                }
            }
        }
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                JsonRpcResponse::error(id, METHOD_NOT_FOUND, "method not found"),
            );
        }
    };
    match result {
        Ok(result) => (StatusCode::OK, JsonRpcResponse::result(id, result)),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            JsonRpcResponse::error(id, INTERNAL_ERROR, "result serialization failed"),
        ),
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// MCP server errors.
#[derive(Debug, thiserror::Error)]
pub enum McpServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: Tests
// ============================================================================
