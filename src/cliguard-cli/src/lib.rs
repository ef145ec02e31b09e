//! Cliguard - an MCP server that runs allow-listed commands inside one
//! directory.
//!
//! - `args` - command line, environment and TOML settings
//! - `tools` - the `run_command` and `show_security_rules` tools
//! - `logging` - stderr tracing setup

pub mod args;
pub mod logging;
pub mod tools;

use std::sync::Arc;

use anyhow::Result;
use cliguard_exec::CommandExecutor;
use cliguard_mcp_server::{McpServer, McpServerBuilder};

pub use args::Args;
pub use tools::{RunCommandHandler, ShowSecurityRulesHandler};

/// Name reported in the `initialize` handshake.
pub const SERVER_NAME: &str = "cliguard";

/// Version reported in the `initialize` handshake.
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Instructions sent to clients in the `initialize` response.
pub fn server_instructions(executor: &CommandExecutor) -> String {
    format!(
        "Runs allow-listed commands inside {}. Call show_security_rules to see \
         which commands, flags and shell operators are permitted before using run_command.",
        executor.policy().root_dir().display()
    )
}

/// Builds the MCP server with both tools bound to `executor`.
pub fn build_server(executor: Arc<CommandExecutor>) -> Result<Arc<McpServer>> {
    McpServerBuilder::new(SERVER_NAME, SERVER_VERSION)
        .instructions(server_instructions(&executor))
        .tool_handler(Arc::new(RunCommandHandler::new(Arc::clone(&executor))))
        .tool_handler(Arc::new(ShowSecurityRulesHandler::new(executor)))
        .build()
}
