//! Command-line arguments and policy settings assembly.

use std::path::PathBuf;

use clap::Parser;
use cliguard_exec::ExecutionMode;
use cliguard_execpolicy::{AllowList, ConfigError, PolicySettings, parse_toggle};

/// Cliguard - run allow-listed commands inside one directory over MCP
#[derive(Debug, Parser)]
#[command(name = "cliguard")]
#[command(version)]
pub struct Args {
    /// TOML file with policy settings; flags and environment variables override it
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory commands run in and may not escape
    #[arg(long, env = "ALLOWED_DIR")]
    pub allowed_dir: Option<PathBuf>,

    /// Comma-separated command names, or "all"
    #[arg(long, env = "ALLOWED_COMMANDS")]
    pub allowed_commands: Option<String>,

    /// Comma-separated flags, or "all"
    #[arg(long, env = "ALLOWED_FLAGS", allow_hyphen_values = true)]
    pub allowed_flags: Option<String>,

    /// Longest command line accepted, in characters
    #[arg(long, env = "MAX_COMMAND_LENGTH")]
    pub max_command_length: Option<usize>,

    /// Seconds before a running command is terminated
    #[arg(long, env = "COMMAND_TIMEOUT")]
    pub command_timeout: Option<u64>,

    /// Allow &&, ||, |, >, >>, <, << and ; ("true" or "1" to enable)
    #[arg(long, env = "ALLOW_SHELL_OPERATORS", value_parser = parse_toggle_arg)]
    pub allow_shell_operators: Option<bool>,

    /// How commands run when the caller does not ask for a terminal: shell or pty
    #[arg(long, env = "CLIGUARD_EXEC_MODE", default_value_t = ExecutionMode::Shell)]
    pub mode: ExecutionMode,

    /// Log level
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Enable JSON logging
    #[arg(long)]
    pub json_logs: bool,
}

fn parse_toggle_arg(value: &str) -> Result<bool, String> {
    Ok(parse_toggle(value))
}

impl Args {
    /// Builds the raw policy settings.
    ///
    /// Precedence, lowest first: built-in defaults, the `--config` file, then
    /// flags and environment variables.
    pub fn policy_settings(&self) -> Result<PolicySettings, ConfigError> {
        let mut settings = match &self.config {
            Some(path) => PolicySettings::load(path)?,
            None => PolicySettings::default(),
        };

        if let Some(dir) = &self.allowed_dir {
            settings.allowed_dir = Some(dir.clone());
        }
        if let Some(commands) = &self.allowed_commands {
            settings.allowed_commands = AllowList::parse(commands);
        }
        if let Some(flags) = &self.allowed_flags {
            settings.allowed_flags = AllowList::parse(flags);
        }
        if let Some(max) = self.max_command_length {
            settings.max_command_length = max;
        }
        if let Some(timeout) = self.command_timeout {
            settings.command_timeout = timeout;
        }
        if let Some(allow) = self.allow_shell_operators {
            settings.allow_shell_operators = allow;
        }

        Ok(settings)
    }
}
