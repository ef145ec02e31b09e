//! Tool handler traits and implementations.

use anyhow::Result;
use cliguard_mcp_types::{CallToolResult, Tool};
use serde_json::Value;

/// A tool the server can expose.
///
/// An `Err` from [`ToolHandler::execute`] is reported to the client as an
/// error result, not as a JSON-RPC failure.
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync {
    /// Get the tool definition.
    fn tool(&self) -> Tool;

    /// Execute the tool with given arguments.
    async fn execute(&self, arguments: Value) -> Result<CallToolResult>;
}

/// A simple function-based tool handler.
pub struct FnToolHandler<F>
where
    F: Fn(Value) -> Result<CallToolResult> + Send + Sync,
{
    tool: Tool,
    handler: F,
}

impl<F> FnToolHandler<F>
where
    F: Fn(Value) -> Result<CallToolResult> + Send + Sync,
{
    pub fn new(tool: Tool, handler: F) -> Self {
        Self { tool, handler }
    }
}

#[async_trait::async_trait]
impl<F> ToolHandler for FnToolHandler<F>
where
    F: Fn(Value) -> Result<CallToolResult> + Send + Sync,
{
    fn tool(&self) -> Tool {
        self.tool.clone()
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        (self.handler)(arguments)
    }
}
