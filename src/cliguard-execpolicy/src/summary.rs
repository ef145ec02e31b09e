//! Human-readable policy summary.

use std::fmt;

use serde::Serialize;

use crate::config::PolicyConfig;
use crate::operators::ShellOperator;

/// What a caller is allowed to do, for display.
///
/// Only the root directory is exposed; resolved argument paths never are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicySummary {
    pub working_directory: String,
    /// Sorted, or `None` when every command is allowed.
    pub allowed_commands: Option<Vec<String>>,
    /// Sorted, or `None` when every flag is allowed.
    pub allowed_flags: Option<Vec<String>>,
    pub max_command_length: usize,
    pub command_timeout_secs: u64,
    pub shell_operators: bool,
}

impl PolicySummary {
    pub fn from_config(config: &PolicyConfig) -> Self {
        let to_owned = |entries: Vec<&str>| entries.into_iter().map(str::to_string).collect();
        Self {
            working_directory: config.root_dir().display().to_string(),
            allowed_commands: config.allowed_commands().entries().map(to_owned),
            allowed_flags: config.allowed_flags().entries().map(to_owned),
            max_command_length: config.max_command_length(),
            command_timeout_secs: config.command_timeout().as_secs(),
            shell_operators: config.allow_shell_operators(),
        }
    }

    /// One-line rendering of the operator vocabulary, e.g. `&&, ||, |`.
    pub fn operator_list() -> String {
        ShellOperator::ALL
            .iter()
            .map(|op| op.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for PolicySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let commands = match &self.allowed_commands {
            Some(list) => list.join(", "),
            None => "All commands allowed".to_string(),
        };
        let flags = match &self.allowed_flags {
            Some(list) => list.join(", "),
            None => "All flags allowed".to_string(),
        };

        writeln!(f, "Security Configuration:")?;
        writeln!(f, "==================")?;
        writeln!(f, "Working Directory: {}", self.working_directory)?;
        writeln!(f)?;
        writeln!(f, "Allowed Commands:")?;
        writeln!(f, "----------------")?;
        writeln!(f, "{commands}")?;
        writeln!(f)?;
        writeln!(f, "Allowed Flags:")?;
        writeln!(f, "-------------")?;
        writeln!(f, "{flags}")?;
        writeln!(f)?;
        writeln!(f, "Security Limits:")?;
        writeln!(f, "---------------")?;
        writeln!(f, "Max Command Length: {} characters", self.max_command_length)?;
        writeln!(f, "Command Timeout: {} seconds", self.command_timeout_secs)?;
        write!(
            f,
            "Shell Operators ({}): {}",
            Self::operator_list(),
            if self.shell_operators {
                "supported"
            } else {
                "not supported"
            }
        )
    }
}
