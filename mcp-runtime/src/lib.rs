use std::time::Duration;

use clap::Args;
use serde_json::{Map, Value, json};
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

pub mod client;
pub mod format;
pub mod query;
pub mod tools;
mod util;

pub use client::{
    ClientConfig, ClientError, ExchangeObserver, LoanProClient, NoopObserver, TracingObserver,
};

use tools::{ToolError, call_tool, tool_definitions};

pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";
pub const MCP_SERVER_NAME: &str = "loanpro-mcp";

/// Connection settings for the LoanPro API.
#[derive(Args, Clone, Debug)]
pub struct LoanProArgs {
    /// LoanPro API base URL
    #[arg(long, env = "LOANPRO_API_URL")]
    pub api_url: String,
    /// Static API token (sent as a bearer token)
    #[arg(long, env = "LOANPRO_API_KEY", hide_env_values = true)]
    pub api_key: String,
    /// Tenant ID, sent as the Autopal-Instance-Id header
    #[arg(long, env = "LOANPRO_TENANT_ID")]
    pub tenant_id: String,
    /// Timeout for each remote call, in seconds
    #[arg(long, env = "LOANPRO_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,
}

impl LoanProArgs {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api_url.clone(),
            api_key: self.api_key.clone(),
            tenant_id: self.tenant_id.clone(),
            timeout: Duration::from_secs(self.timeout_secs.max(1)),
        }
    }
}

/// JSON-RPC message handler shared by every transport.
///
/// Holds no per-session state; clones share the underlying HTTP pool.
#[derive(Clone, Debug)]
pub struct McpServer {
    client: LoanProClient,
}

impl McpServer {
    pub fn new(client: LoanProClient) -> Self {
        Self { client }
    }

    /// Serves newline-delimited JSON-RPC over the process stdio.
    pub async fn serve_stdio(&self) -> io::Result<()> {
        let reader = BufReader::new(io::stdin());
        let writer = io::stdout();
        self.serve_lines(reader, writer).await
    }

    /// One message per line in, one response per line out. Returns at EOF.
    pub async fn serve_lines<R, W>(&self, reader: R, mut writer: W) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let responses = match serde_json::from_str::<Value>(line) {
                Ok(incoming) => self.handle_message(incoming).await,
                Err(err) => {
                    tracing::warn!(event = "mcp_parse_error", error = %err);
                    vec![parse_error_response()]
                }
            };
            for response in responses {
                let line = encode_line(&response);
                writer.write_all(&line).await?;
                writer.flush().await?;
            }
        }
        Ok(())
    }

    /// Handles a single message or a batch. Notifications produce nothing.
    pub async fn handle_message(&self, incoming: Value) -> Vec<Value> {
        let mut responses = Vec::new();

        if let Value::Array(batch) = incoming {
            if batch.is_empty() {
                responses.push(error_response(
                    Value::Null,
                    RpcError::invalid_request("Batch request must not be empty"),
                ));
                return responses;
            }
            for item in batch {
                if let Some(response) = self.handle_single_message(item).await {
                    responses.push(response);
                }
            }
            return responses;
        }

        if let Some(response) = self.handle_single_message(incoming).await {
            responses.push(response);
        }
        responses
    }

    async fn handle_single_message(&self, incoming: Value) -> Option<Value> {
        let Some(obj) = incoming.as_object() else {
            return Some(error_response(
                Value::Null,
                RpcError::invalid_request("Request must be a JSON object"),
            ));
        };

        if obj.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
            let id = obj.get("id").cloned().unwrap_or(Value::Null);
            return Some(error_response(
                id,
                RpcError::invalid_request("jsonrpc must be '2.0'"),
            ));
        }

        let Some(method) = obj.get("method").and_then(Value::as_str) else {
            // A response to a server request; this server never issues any.
            return None;
        };

        let params = obj.get("params").cloned().unwrap_or(Value::Null);
        if let Some(id) = obj.get("id").cloned() {
            let result = self.handle_request(method, params).await;
            Some(match result {
                Ok(payload) => success_response(id, payload),
                Err(err) => error_response(id, err),
            })
        } else {
            self.handle_notification(method);
            None
        }
    }

    fn handle_notification(&self, method: &str) {
        match method {
            "initialized" | "notifications/initialized" => {
                tracing::info!(event = "mcp_client_initialized");
            }
            other => tracing::debug!(event = "mcp_notification_ignored", method = %other),
        }
    }

    async fn handle_request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        match method {
            "initialize" => Ok(self.initialize_payload(&params)),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(self.tools_list_payload()),
            "tools/call" => self.handle_tools_call(params).await,
            "resources/list" => Ok(json!({ "resources": [] })),
            "prompts/list" => Ok(json!({ "prompts": [] })),
            _ => Err(RpcError::method_not_found(method)),
        }
    }

    fn initialize_payload(&self, params: &Value) -> Value {
        let protocol_version = params
            .get("protocolVersion")
            .and_then(Value::as_str)
            .filter(|version| !version.is_empty())
            .unwrap_or(MCP_PROTOCOL_VERSION);
        json!({
            "protocolVersion": protocol_version,
            "capabilities": {
                "tools": {
                    "listChanged": false
                }
            },
            "serverInfo": {
                "name": MCP_SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION")
            }
        })
    }

    fn tools_list_payload(&self) -> Value {
        let tools: Vec<Value> = tool_definitions()
            .into_iter()
            .map(|tool| {
                json!({
                    "name": tool.name,
                    "description": tool.description,
                    "inputSchema": tool.input_schema,
                })
            })
            .collect();
        json!({ "tools": tools })
    }

    async fn handle_tools_call(&self, params: Value) -> Result<Value, RpcError> {
        let params = params
            .as_object()
            .ok_or_else(|| RpcError::invalid_params("tools/call params must be an object"))?;

        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| RpcError::invalid_params("tools/call requires string field 'name'"))?;

        let args = match params.get("arguments") {
            Some(Value::Object(map)) => map.clone(),
            Some(Value::Null) | None => Map::new(),
            Some(_) => {
                return Err(RpcError::invalid_params(
                    "tools/call 'arguments' must be an object",
                ));
            }
        };

        match call_tool(&self.client, name, &args).await {
            Ok(text) => Ok(json!({
                "content": [
                    { "type": "text", "text": text }
                ]
            })),
            Err(err) => {
                let arguments = serde_json::Value::Object(args).to_string();
                tracing::error!(
                    event = "mcp_tool_failed",
                    tool = %name,
                    arguments = %arguments,
                    error = %err,
                );
                Err(RpcError::from(err))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    pub data: Option<Value>,
}

impl RpcError {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
    /// Sentinel for a tool that ran and failed upstream.
    pub const TOOL_FAILED: i64 = -1;

    fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn parse_error() -> Self {
        Self::new(Self::PARSE_ERROR, "Parse error")
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(Self::INVALID_REQUEST, message)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(Self::METHOD_NOT_FOUND, format!("Method not found: {method}"))
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(Self::INVALID_PARAMS, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(Self::INTERNAL_ERROR, message)
    }

    pub fn tool_failed(message: impl Into<String>) -> Self {
        Self::new(Self::TOOL_FAILED, message)
    }

    fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

impl From<ToolError> for RpcError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::InvalidArguments { message, field } => {
                let rpc = RpcError::invalid_params(message);
                match field {
                    Some(field) => rpc.with_data(json!({ "field": field })),
                    None => rpc,
                }
            }
            ToolError::UnknownTool(name) => {
                RpcError::new(Self::METHOD_NOT_FOUND, format!("Tool not found: {name}"))
            }
            ToolError::Execution(inner) => RpcError::tool_failed(inner.to_string()),
        }
    }
}

pub fn success_response(id: Value, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
}

pub fn error_response(id: Value, error: RpcError) -> Value {
    let mut payload = json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": error.code,
            "message": error.message
        }
    });
    if let Some(data) = error.data {
        payload["error"]["data"] = data;
    }
    payload
}

/// Reply for a message that is not valid JSON; the id is unknown.
pub fn parse_error_response() -> Value {
    error_response(Value::Null, RpcError::parse_error())
}

/// Serializes one outbound frame. A response that cannot be serialized is
/// replaced by an internal error carrying the same id.
fn encode_line(response: &Value) -> Vec<u8> {
    let mut body = match serde_json::to_vec(response) {
        Ok(body) => body,
        Err(err) => {
            tracing::error!(event = "mcp_serialize_failed", error = %err);
            let id = response.get("id").cloned().unwrap_or(Value::Null);
            let fallback = error_response(
                id,
                RpcError::internal(format!("Failed to serialize response: {err}")),
            );
            serde_json::to_vec(&fallback).unwrap_or_else(|_| {
                br#"{"jsonrpc":"2.0","id":null,"error":{"code":-32603,"message":"Internal error"}}"#
                    .to_vec()
            })
        }
    };
    body.push(b'\n');
    body
}
