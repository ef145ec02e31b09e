//! Cliguard MCP Server - serves tools over newline-delimited JSON-RPC.
//!
//! The server answers the lifecycle handshake, `ping`, `tools/list` and
//! `tools/call`. Tool calls run concurrently; notifications are
//! handled inline and never answered.
//!
//! # Example
//! ```rust,no_run
//! use cliguard_mcp_server::McpServerBuilder;
//! use cliguard_mcp_types::{CallToolResult, Tool};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let server = McpServerBuilder::new("my-server", "1.0.0")
//!         .tool_fn(Tool::new("hello", "Say hello"), |_| Ok(CallToolResult::text("hello")))
//!         .build()?;
//!
//!     server.run_stdio().await
//! }
//! ```

mod builder;
mod handlers;
mod server;

pub use builder::McpServerBuilder;
pub use handlers::{FnToolHandler, ToolHandler};
pub use server::{McpServer, ServerState};

pub use cliguard_mcp_types;
