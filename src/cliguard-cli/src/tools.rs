//! The two tools the server exposes: `run_command` and `show_security_rules`.

use std::sync::Arc;

use anyhow::Result;
use cliguard_exec::{CommandExecutor, ExecError, ExecutionMode, ExecutionResult};
use cliguard_execpolicy::{AllowList, PolicyConfig};
use cliguard_mcp_server::ToolHandler;
use cliguard_mcp_types::{CallToolResult, Content, Tool};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

pub const RUN_COMMAND: &str = "run_command";
pub const SHOW_SECURITY_RULES: &str = "show_security_rules";

/// Arguments accepted by `run_command`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct RunCommandArgs {
    /// Single command to execute (example: 'ls -l' or 'cat file.txt')
    pub command: String,

    /// Run attached to a pseudo-terminal; stdout and stderr arrive combined
    #[serde(default)]
    pub pty: Option<bool>,
}

/// Description advertised for `run_command`, built from the active policy.
pub fn run_command_description(policy: &PolicyConfig) -> String {
    let describe = |list: &AllowList, all: &str| match list.entries() {
        Some(entries) => entries.join(", "),
        None => all.to_string(),
    };

    format!(
        "Allows command (CLI) execution in the directory: {}\n\n\
         Available commands: {}\n\
         Available flags: {}\n\n\
         Shell operators (&&, ||, |, >, >>, <, <<, ;) are {}. Set ALLOW_SHELL_OPERATORS=true to enable.",
        policy.root_dir().display(),
        describe(policy.allowed_commands(), "all commands"),
        describe(policy.allowed_flags(), "all flags"),
        if policy.allow_shell_operators() {
            "supported"
        } else {
            "not supported"
        },
    )
}

/// Renders a finished command: stdout, stderr, then the exit status line.
///
/// Empty streams are left out. A non-zero exit is not an error result; the
/// caller reads the code.
pub fn render_result(result: &ExecutionResult) -> CallToolResult {
    let mut content = Vec::with_capacity(3);
    if !result.stdout.is_empty() {
        content.push(Content::text(&result.stdout));
    }
    if !result.stderr.is_empty() {
        content.push(Content::text(&result.stderr));
    }
    content.push(Content::text(format!(
        "\nCommand completed with return code: {}",
        result.exit_code
    )));
    CallToolResult::with_content(content)
}

/// Renders a rejection, timeout or execution failure as an error result.
pub fn render_error(err: &ExecError) -> CallToolResult {
    match err {
        ExecError::Security(_) => CallToolResult::error(err.to_string()),
        ExecError::Timeout { partial, .. } => {
            let mut result = CallToolResult::error(err.to_string());
            let partial_output = partial
                .as_deref()
                .map(|p| p.stdout.as_str())
                .filter(|out| !out.is_empty());
            if let Some(output) = partial_output {
                result.content.push(Content::text(output));
            }
            result
        }
        ExecError::Execution { .. } => CallToolResult::error(format!("Error: {err}")),
    }
}

/// Validates and runs one command line.
pub struct RunCommandHandler {
    executor: Arc<CommandExecutor>,
}

impl RunCommandHandler {
    pub fn new(executor: Arc<CommandExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait::async_trait]
impl ToolHandler for RunCommandHandler {
    fn tool(&self) -> Tool {
        Tool::from_args::<RunCommandArgs>(
            RUN_COMMAND,
            run_command_description(self.executor.policy()),
        )
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        if arguments.get("command").is_none_or(Value::is_null) {
            return Ok(CallToolResult::error("No command provided"));
        }

        let args: RunCommandArgs = match serde_json::from_value(arguments) {
            Ok(args) => args,
            Err(e) => return Ok(CallToolResult::error(format!("Error: Invalid arguments: {e}"))),
        };

        let mode = match args.pty {
            Some(true) => ExecutionMode::Pty,
            Some(false) => ExecutionMode::Shell,
            None => self.executor.default_mode(),
        };
        debug!(%mode, "run_command requested");

        Ok(match self.executor.execute_with_mode(&args.command, mode).await {
            Ok(result) => render_result(&result),
            Err(err) => render_error(&err),
        })
    }
}

/// Reports the active policy.
pub struct ShowSecurityRulesHandler {
    executor: Arc<CommandExecutor>,
}

impl ShowSecurityRulesHandler {
    pub fn new(executor: Arc<CommandExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait::async_trait]
impl ToolHandler for ShowSecurityRulesHandler {
    fn tool(&self) -> Tool {
        Tool::new(
            SHOW_SECURITY_RULES,
            "Show what commands and operations are allowed in this environment.\n",
        )
    }

    async fn execute(&self, _arguments: Value) -> Result<CallToolResult> {
        Ok(CallToolResult::text(self.executor.summary().to_string()))
    }
}
