//! MCP Server core implementation.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{Notify, RwLock, mpsc};
use tracing::{debug, info, warn};

use cliguard_mcp_types::{
    CallToolParams, CallToolResult, Implementation, IncomingMessage, InitializeParams,
    InitializeResult, JSONRPC_VERSION, JsonRpcError, JsonRpcResponse, ListToolsResult, RequestId,
    ServerCapabilities, Tool, methods,
};

use crate::handlers::ToolHandler;

// ============================================================================
// MCP Server
// ============================================================================

/// MCP server state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// No `initialize` request seen yet.
    Uninitialized,
    /// `initialize` answered, waiting for `notifications/initialized`.
    Initializing,
    /// Handshake complete.
    Ready,
    /// `stop` was called; no further input is read.
    ShuttingDown,
    /// The transport loop has exited.
    Stopped,
}

/// MCP Server implementation.
pub struct McpServer {
    info: Implementation,
    capabilities: ServerCapabilities,
    /// Registered tool handlers, in `tools/list` order.
    tools: Vec<Arc<dyn ToolHandler>>,
    state: RwLock<ServerState>,
    /// Wakes the transport loop when `stop` is called.
    shutdown: Notify,
    instructions: Option<String>,
}

impl McpServer {
    /// Create a new MCP server with no tools.
    pub fn new(info: Implementation, capabilities: ServerCapabilities) -> Self {
        Self {
            info,
            capabilities,
            tools: Vec::new(),
            state: RwLock::new(ServerState::Uninitialized),
            shutdown: Notify::new(),
            instructions: None,
        }
    }

    pub(crate) fn with_tools(mut self, tools: Vec<Arc<dyn ToolHandler>>) -> Self {
        self.tools = tools;
        self
    }

    pub(crate) fn with_instructions(mut self, instructions: Option<String>) -> Self {
        self.instructions = instructions;
        self
    }

    pub fn info(&self) -> &Implementation {
        &self.info
    }

    pub fn capabilities(&self) -> &ServerCapabilities {
        &self.capabilities
    }

    pub async fn state(&self) -> ServerState {
        *self.state.read().await
    }

    /// All registered tools, in registration order.
    pub fn tools(&self) -> Vec<Tool> {
        self.tools.iter().map(|h| h.tool()).collect()
    }

    fn find_tool(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.tools.iter().find(|h| h.tool().name == name).cloned()
    }

    /// Stop reading input. Requests already in flight still get answered
    /// before `serve` returns.
    pub async fn stop(&self) {
        info!("Stopping MCP server");
        *self.state.write().await = ServerState::ShuttingDown;
        // Stored as a permit if the loop is not waiting yet.
        self.shutdown.notify_one();
    }

    // ========================================================================
    // Message Handling
    // ========================================================================

    /// Handle one raw line from the transport.
    ///
    /// Returns `None` for notifications, which never get a response.
    pub async fn handle_message(&self, line: &str) -> Option<JsonRpcResponse> {
        match parse_message(line) {
            Ok(message) if message.is_notification() => {
                self.handle_notification(message).await;
                None
            }
            Ok(message) => Some(self.handle_request(message).await),
            Err(response) => Some(response),
        }
    }

    /// Handle a JSON-RPC request.
    pub async fn handle_request(&self, request: IncomingMessage) -> JsonRpcResponse {
        let id = request.id;
        debug!(method = %request.method, id = ?id, "Handling request");

        let result = match request.method.as_str() {
            methods::INITIALIZE => self.handle_initialize(request.params).await,
            methods::PING => Ok(json!({})),
            methods::TOOLS_LIST => self.handle_list_tools(),
            methods::TOOLS_CALL => self.handle_call_tool(request.params).await,
            _ => Err(JsonRpcError::method_not_found(&request.method)),
        };

        match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(error) => {
                debug!(code = error.code, "Request failed: {}", error.message);
                JsonRpcResponse::error(id, error)
            }
        }
    }

    /// Handle a JSON-RPC notification.
    pub async fn handle_notification(&self, notification: IncomingMessage) {
        debug!(method = %notification.method, "Handling notification");

        match notification.method.as_str() {
            methods::INITIALIZED => {
                *self.state.write().await = ServerState::Ready;
                info!("Server initialized and ready");
            }
            methods::CANCELLED => {
                // Commands are bounded by their own timeout; cancellation is not honoured.
                debug!("Ignoring cancellation notification");
            }
            _ => {
                warn!(method = %notification.method, "Unknown notification");
            }
        }
    }

    async fn handle_initialize(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        {
            let mut state = self.state.write().await;
            if *state != ServerState::Uninitialized {
                return Err(JsonRpcError::invalid_request("Server already initialized"));
            }
            *state = ServerState::Initializing;
        }

        let init_params: Option<InitializeParams> = params
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| JsonRpcError::invalid_params(format!("Invalid params: {e}")))?;

        if let Some(init_params) = init_params {
            let protocol = init_params.protocol_version.as_deref().unwrap_or("unspecified");
            match &init_params.client_info {
                Some(client) => info!(
                    client = %client.name,
                    version = %client.version,
                    protocol,
                    "Client connected"
                ),
                None => info!(protocol, "Client connected"),
            }
        }

        let mut result = InitializeResult::new(self.info.clone(), self.capabilities.clone());
        if let Some(instructions) = &self.instructions {
            result = result.with_instructions(instructions);
        }

        to_result_value(result)
    }

    fn handle_list_tools(&self) -> Result<Value, JsonRpcError> {
        to_result_value(ListToolsResult::new(self.tools()))
    }

    async fn handle_call_tool(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let params = params.ok_or_else(|| JsonRpcError::invalid_params("Missing params"))?;
        let call_params: CallToolParams = serde_json::from_value(params)
            .map_err(|e| JsonRpcError::invalid_params(format!("Invalid params: {e}")))?;

        let handler = self.find_tool(&call_params.name).ok_or_else(|| {
            JsonRpcError::invalid_params(format!("Unknown tool: {}", call_params.name))
        })?;

        let started = Instant::now();
        let arguments = call_params.arguments.unwrap_or_else(|| json!({}));
        let result = handler
            .execute(arguments)
            .await
            .unwrap_or_else(|e| CallToolResult::error(e.to_string()));

        info!(
            tool = %call_params.name,
            is_error = result.is_error(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Tool call finished"
        );

        to_result_value(result)
    }

    // ========================================================================
    // Transport: Stdio
    // ========================================================================

    /// Run the server over stdin/stdout until stdin closes.
    pub async fn run_stdio(self: Arc<Self>) -> Result<()> {
        info!(server = %self.info.name, "Starting MCP server with stdio transport");
        let reader = BufReader::new(tokio::io::stdin());
        let mut stdout = tokio::io::stdout();
        self.serve(reader, &mut stdout).await
    }

    /// Serve newline-delimited JSON-RPC from `reader`, writing responses to
    /// `writer`.
    ///
    /// Lifecycle requests are answered in arrival order. Each `tools/call`
    /// runs on its own task, so a slow command does not hold up the rest, and
    /// its response is written when it completes. After end of input or
    /// [`McpServer::stop`] the loop keeps running until every in-flight
    /// request has answered.
    pub async fn serve<R, W>(self: Arc<Self>, reader: R, writer: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + ?Sized,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<JsonRpcResponse>();
        let mut tx = Some(tx);
        let mut lines = reader.lines();

        loop {
            tokio::select! {
                _ = self.shutdown.notified(), if tx.is_some() => {
                    debug!("Stop requested, no longer reading input");
                    tx = None;
                }
                line = lines.next_line(), if tx.is_some() => {
                    match line.context("Failed to read message")? {
                        Some(line) => {
                            if let Some(sender) = &tx {
                                self.dispatch(&line, sender).await;
                            }
                        }
                        None => {
                            debug!("EOF received, shutting down");
                            tx = None;
                        }
                    }
                }
                Some(response) = rx.recv() => write_message(writer, &response).await?,
                else => break,
            }
        }

        *self.state.write().await = ServerState::Stopped;
        info!("MCP server stopped");
        Ok(())
    }

    async fn dispatch(self: &Arc<Self>, line: &str, sender: &mpsc::UnboundedSender<JsonRpcResponse>) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return;
        }

        match parse_message(trimmed) {
            Ok(message) if message.is_notification() => self.handle_notification(message).await,
            Ok(message) if message.method != methods::TOOLS_CALL => {
                let _ = sender.send(self.handle_request(message).await);
            }
            Ok(message) => {
                let server = Arc::clone(self);
                let sender = sender.clone();
                tokio::spawn(async move {
                    let response = server.handle_request(message).await;
                    // The receiver only goes away if the writer failed.
                    let _ = sender.send(response);
                });
            }
            Err(response) => {
                let _ = sender.send(response);
            }
        }
    }
}

/// Parse a line into a message, or the error response to send instead.
fn parse_message(line: &str) -> std::result::Result<IncomingMessage, JsonRpcResponse> {
    let value: Value = serde_json::from_str(line).map_err(|e| {
        warn!(error = %e, "Invalid JSON received");
        JsonRpcResponse::error(None, JsonRpcError::parse_error(format!("Parse error: {e}")))
    })?;

    let id = value
        .get("id")
        .cloned()
        .and_then(|id| serde_json::from_value::<RequestId>(id).ok());

    let message: IncomingMessage = serde_json::from_value(value).map_err(|e| {
        warn!(error = %e, "Invalid JSON-RPC message");
        JsonRpcResponse::error(
            id.clone(),
            JsonRpcError::invalid_request(format!("Invalid request: {e}")),
        )
    })?;

    if message.jsonrpc != JSONRPC_VERSION {
        return Err(JsonRpcResponse::error(
            id,
            JsonRpcError::invalid_request(format!(
                "Unsupported jsonrpc version: {}",
                message.jsonrpc
            )),
        ));
    }

    Ok(message)
}

fn to_result_value<T: serde::Serialize>(value: T) -> Result<Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| JsonRpcError::internal_error(e.to_string()))
}

async fn write_message<W>(writer: &mut W, response: &JsonRpcResponse) -> Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut json = serde_json::to_string(response).context("Failed to serialize response")?;
    json.push('\n');
    writer
        .write_all(json.as_bytes())
        .await
        .context("Failed to write response")?;
    writer.flush().await.context("Failed to flush response")?;
    Ok(())
}
