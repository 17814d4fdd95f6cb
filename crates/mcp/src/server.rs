// MCP server: newline-delimited JSON-RPC over stdio.
// Requests are handled concurrently; responses funnel through one writer.

use crate::protocol::{
    negotiate_protocol_version, CallToolParams, InitializeParams, InitializeResult, JsonRpcError,
    JsonRpcRequest, JsonRpcResponse, ListToolsResult, ServerCapabilities, ServerInfo,
    ToolsCapability, JSONRPC_VERSION,
};
use crate::tools::ToolRegistry;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

/// Pending responses buffered between request tasks and the writer.
const RESPONSE_QUEUE_DEPTH: usize = 64;

pub struct McpServer {
    registry: Arc<ToolRegistry>,
    server_info: ServerInfo,
    instructions: Option<String>,
}

impl McpServer {
    pub fn new(registry: ToolRegistry, server_info: ServerInfo) -> Self {
        Self {
            registry: Arc::new(registry),
            server_info,
            instructions: None,
        }
    }

    /// Text returned to clients in the `initialize` result.
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Serve on stdin/stdout until stdin closes.
    pub async fn start(self) -> Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        self.serve(stdin, tokio::io::stdout()).await
    }

    /// Serve requests read line by line from `reader`, writing one response
    /// line per request to `writer`. Returns once the input is exhausted and
    /// every in-flight request has been answered.
    pub async fn serve<R, W>(self, reader: R, writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let server = Arc::new(self);
        let (tx, mut rx) = mpsc::channel::<String>(RESPONSE_QUEUE_DEPTH);

        let writer_task = tokio::spawn(async move {
            let mut writer = writer;
            while let Some(line) = rx.recv().await {
                writer.write_all(line.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
            Ok::<_, std::io::Error>(())
        });

        tracing::info!(
            server = %server.server_info.name,
            tools = server.registry.len(),
            "MCP server listening on stdio"
        );

        let mut lines = reader.lines();
        let mut seq: u64 = 0;

        while let Some(line) = lines.next_line().await.context("Failed to read request")? {
            if line.trim().is_empty() {
                continue;
            }
            seq += 1;

            let server = server.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let start = std::time::Instant::now();
                let Some(response) = server.handle_line(&line).await else {
                    return;
                };

                if let Some(error) = &response.error {
                    tracing::warn!(req = seq, code = error.code, message = %error.message, "Request failed");
                } else {
                    tracing::debug!(req = seq, elapsed_ms = start.elapsed().as_millis() as u64, "Request completed");
                }

                match serde_json::to_string(&response) {
                    Ok(json) => {
                        if tx.send(json).await.is_err() {
                            tracing::debug!(req = seq, "Response writer closed, dropping response");
                        }
                    }
                    Err(e) => tracing::error!(req = seq, error = %e, "Failed to serialize response"),
                }
            });
        }

        tracing::info!("Input closed, waiting for in-flight requests");
        drop(tx);

        writer_task
            .await
            .context("Response writer task failed")?
            .context("Failed to write response")?;

        Ok(())
    }

    /// Handle one raw input line. Returns `None` for notifications.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let value: serde_json::Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                return Some(JsonRpcResponse::error(
                    serde_json::Value::Null,
                    JsonRpcError::parse_error(e.to_string()),
                ))
            }
        };

        let id = value.get("id").cloned().unwrap_or(serde_json::Value::Null);
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                return Some(JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_request(format!("Invalid Request: {}", e)),
                ))
            }
        };

        if request.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_request(format!(
                    "Invalid JSON-RPC version: expected {}, got {}",
                    JSONRPC_VERSION, request.jsonrpc
                )),
            ));
        }

        self.handle_request(request).await
    }

    /// Handle a parsed request. Returns `None` for notifications.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        tracing::debug!(method = %request.method, id = ?request.id, "Handling request");

        let is_notification = request.is_notification();
        let outcome = match request.method.as_str() {
            "initialize" => self.initialize(request.params),
            "ping" => Ok(serde_json::json!({})),
            "tools/list" => self.list_tools(),
            "tools/call" => self.call_tool(request.params).await,
            method if method.starts_with("notifications/") => {
                tracing::debug!(method, "Notification received");
                return None;
            }
            method => Err(JsonRpcError::method_not_found(method)),
        };

        // Notifications never get a response, even on error
        if is_notification {
            return None;
        }
        let id = request.id.unwrap_or_default();

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::error(id, error),
        })
    }

    fn initialize(&self, params: Option<serde_json::Value>) -> Result<serde_json::Value, JsonRpcError> {
        let params: Option<InitializeParams> = params
            .map(serde_json::from_value::<InitializeParams>)
            .transpose()
            .map_err(|e| JsonRpcError::invalid_params(format!("Invalid initialize params: {}", e)))?;

        let requested = params
            .as_ref()
            .map(|p| p.protocol_version.as_str())
            .unwrap_or_default();
        let protocol_version = negotiate_protocol_version(requested);

        if let Some(client) = params.as_ref().and_then(|p| p.client_info.as_ref()) {
            tracing::info!(
                client = %client.name,
                client_version = %client.version,
                protocol_version,
                "Client initialized"
            );
        }

        let result = InitializeResult {
            protocol_version: protocol_version.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: false }),
            },
            server_info: self.server_info.clone(),
            instructions: self.instructions.clone(),
        };

        to_result(&result)
    }

    fn list_tools(&self) -> Result<serde_json::Value, JsonRpcError> {
        to_result(&ListToolsResult {
            tools: self.registry.list_schemas(),
        })
    }

    async fn call_tool(&self, params: Option<serde_json::Value>) -> Result<serde_json::Value, JsonRpcError> {
        let params = params.ok_or_else(|| JsonRpcError::invalid_params("Missing params for tools/call"))?;
        let params: CallToolParams = serde_json::from_value(params)
            .map_err(|e| JsonRpcError::invalid_params(format!("Invalid tools/call params: {}", e)))?;

        let tool = self
            .registry
            .get(&params.name)
            .ok_or_else(|| JsonRpcError::invalid_params(format!("Unknown tool: {}", params.name)))?;

        tracing::info!(tool = %params.name, "Calling tool");

        let result = tool
            .execute(params.arguments)
            .await
            .map_err(|e| JsonRpcError::internal_error(format!("{:#}", e)))?;

        to_result(&result)
    }
}

fn to_result<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, JsonRpcError> {
    serde_json::to_value(value)
        .map_err(|e| JsonRpcError::internal_error(format!("Failed to serialize result: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{CallToolResult, ToolSchema};
    use crate::tools::{json_schema_object, json_schema_string, Tool};
    use tokio::io::AsyncReadExt;

    /// Returns its `text` argument, or a tool error when it is "fail".
    struct EchoTool;

    #[async_trait::async_trait]
    impl Tool for EchoTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "echo".to_string(),
                description: "Echo text".to_string(),
                input_schema: json_schema_object(
                    serde_json::json!({"text": json_schema_string("Text to echo")}),
                    vec!["text"],
                ),
            }
        }

        async fn execute(&self, arguments: serde_json::Value) -> anyhow::Result<CallToolResult> {
            let text = arguments["text"].as_str().unwrap_or_default().to_string();
            if text == "fail" {
                return Ok(CallToolResult::error("asked to fail"));
            }
            Ok(CallToolResult::text(text))
        }
    }

    fn server() -> McpServer {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        McpServer::new(
            registry,
            ServerInfo {
                name: "youtube-mcp-server".to_string(),
                version: "1.0.0".to_string(),
            },
        )
        .with_instructions("YouTube Data API v3 MCP Server")
    }

    #[tokio::test]
    async fn test_initialize() {
        let response = server()
            .handle_request(JsonRpcRequest::new(
                1,
                "initialize",
                Some(serde_json::json!({
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": {"name": "test-client", "version": "0.1"}
                })),
            ))
            .await
            .unwrap();

        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], "2024-11-05");
        assert_eq!(result["serverInfo"]["name"], "youtube-mcp-server");
        assert_eq!(result["capabilities"]["tools"]["listChanged"], false);
        assert_eq!(result["instructions"], "YouTube Data API v3 MCP Server");
    }

    #[tokio::test]
    async fn test_tools_list() {
        let response = server()
            .handle_request(JsonRpcRequest::new(2, "tools/list", None))
            .await
            .unwrap();

        let tools = &response.result.unwrap()["tools"];
        assert_eq!(tools[0]["name"], "echo");
        assert_eq!(tools[0]["inputSchema"]["required"], serde_json::json!(["text"]));
    }

    #[tokio::test]
    async fn test_tools_call_success_and_tool_error() {
        let server = server();

        let ok = server
            .handle_request(JsonRpcRequest::new(
                3,
                "tools/call",
                Some(serde_json::json!({"name": "echo", "arguments": {"text": "hi"}})),
            ))
            .await
            .unwrap();
        let result = ok.result.unwrap();
        assert_eq!(result["content"][0]["text"], "hi");
        assert!(result.get("isError").is_none());

        let failed = server
            .handle_request(JsonRpcRequest::new(
                4,
                "tools/call",
                Some(serde_json::json!({"name": "echo", "arguments": {"text": "fail"}})),
            ))
            .await
            .unwrap();
        // Tool failures are results, not protocol errors
        assert!(failed.error.is_none());
        assert_eq!(failed.result.unwrap()["isError"], true);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_invalid_params() {
        let response = server()
            .handle_request(JsonRpcRequest::new(
                5,
                "tools/call",
                Some(serde_json::json!({"name": "upload_video", "arguments": {}})),
            ))
            .await
            .unwrap();

        let error = response.error.unwrap();
        assert_eq!(error.code, JsonRpcError::INVALID_PARAMS);
        assert!(error.message.contains("upload_video"));
    }

    #[tokio::test]
    async fn test_unknown_method_and_notifications() {
        let server = server();

        let response = server
            .handle_request(JsonRpcRequest::new(6, "resources/list", None))
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, JsonRpcError::METHOD_NOT_FOUND);

        assert!(server
            .handle_request(JsonRpcRequest::notification("notifications/initialized", None))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_handle_line_errors() {
        let server = server();

        let parse = server.handle_line("{not json").await.unwrap();
        assert_eq!(parse.error.unwrap().code, JsonRpcError::PARSE_ERROR);
        assert!(parse.id.is_null());

        let invalid = server.handle_line(r#"[1, 2]"#).await.unwrap();
        assert_eq!(invalid.error.unwrap().code, JsonRpcError::INVALID_REQUEST);

        let version = server
            .handle_line(r#"{"jsonrpc":"1.0","id":7,"method":"ping"}"#)
            .await
            .unwrap();
        assert_eq!(version.id, serde_json::json!(7));
        assert_eq!(version.error.unwrap().code, JsonRpcError::INVALID_REQUEST);

        let null_id = server
            .handle_line(r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#)
            .await
            .unwrap();
        assert!(null_id.id.is_null());
        assert_eq!(null_id.result, Some(serde_json::json!({})));
    }

    #[tokio::test]
    async fn test_serve_answers_every_request() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2025-06-18","capabilities":{}}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"echo","arguments":{"text":"a"}}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":3,"method":"ping"}"#,
            "\n"
        );

        let (client, server_end) = tokio::io::duplex(64 * 1024);
        server().serve(input.as_bytes(), server_end).await.unwrap();

        let mut output = String::new();
        let mut client = client;
        client.read_to_string(&mut output).await.unwrap();

        let mut ids: Vec<i64> = output
            .lines()
            .map(|line| {
                let response: JsonRpcResponse = serde_json::from_str(line).unwrap();
                assert!(response.error.is_none());
                response.id.as_i64().unwrap()
            })
            .collect();
        // Responses may arrive in any order
        ids.sort();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
