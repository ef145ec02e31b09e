//! MCP Server builder for easy server construction.

use std::sync::Arc;

use anyhow::{Result, bail};
use cliguard_mcp_types::{CallToolResult, Implementation, ServerCapabilities, Tool};
use serde_json::Value;

use crate::handlers::{FnToolHandler, ToolHandler};
use crate::server::McpServer;

/// Builder for creating MCP servers.
pub struct McpServerBuilder {
    name: String,
    version: String,
    capabilities: ServerCapabilities,
    tools: Vec<Arc<dyn ToolHandler>>,
    instructions: Option<String>,
}

impl McpServerBuilder {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            capabilities: ServerCapabilities::default(),
            tools: Vec::new(),
            instructions: None,
        }
    }

    /// Add a tool handler.
    pub fn tool_handler(mut self, handler: Arc<dyn ToolHandler>) -> Self {
        self.tools.push(handler);
        self.capabilities = self.capabilities.with_tools();
        self
    }

    /// Add a tool with a synchronous handler function.
    pub fn tool_fn<F>(self, tool: Tool, handler: F) -> Self
    where
        F: Fn(Value) -> Result<CallToolResult> + Send + Sync + 'static,
    {
        self.tool_handler(Arc::new(FnToolHandler::new(tool, handler)))
    }

    /// Set instructions for clients.
    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Build the server.
    ///
    /// Tool names must be unique; the list order is kept for `tools/list`.
    pub fn build(self) -> Result<Arc<McpServer>> {
        let mut names = std::collections::HashSet::new();
        for handler in &self.tools {
            let name = handler.tool().name;
            if !names.insert(name.clone()) {
                bail!("tool '{name}' registered twice");
            }
        }

        let server = McpServer::new(
            Implementation::new(self.name, self.version),
            self.capabilities,
        )
        .with_tools(self.tools)
        .with_instructions(self.instructions);

        Ok(Arc::new(server))
    }
}
