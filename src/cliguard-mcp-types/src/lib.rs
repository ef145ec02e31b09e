//! Cliguard MCP Types - the slice of the Model Context Protocol the sandbox
//! server speaks.
//!
//! Only the lifecycle handshake, `ping` and the tools surface are modelled.
//!
//! # Example
//! ```rust
//! use cliguard_mcp_types::{CallToolResult, Tool};
//!
//! let tool = Tool::new("status", "Show status");
//! let result = CallToolResult::text("ok");
//! assert!(!result.is_error());
//! ```

mod content;
mod initialization;
mod jsonrpc;
mod tools;

/// MCP method name constants.
pub mod methods;

/// Current MCP protocol version.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub use content::Content;
pub use initialization::{
    Implementation, InitializeParams, InitializeResult, ServerCapabilities, ToolsCapability,
};
pub use jsonrpc::{
    ErrorCode, IncomingMessage, JSONRPC_VERSION, JsonRpcError, JsonRpcResponse, RequestId,
};
pub use tools::{CallToolParams, CallToolResult, ListToolsResult, Tool, input_schema_for};
