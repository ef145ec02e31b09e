//! Error types for the policy engine.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::operators::ShellOperator;

/// A command rejected by the policy.
///
/// Every violation is raised before any child process is spawned and names
/// the offending token or operator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    /// The raw command string is longer than the configured maximum.
    #[error("Command exceeds maximum length of {max} (got {length})")]
    LengthExceeded { length: usize, max: usize },

    /// A shell operator was found while operators are disabled.
    #[error("Shell operator '{operator}' is not supported by the active policy")]
    OperatorNotAllowed { operator: ShellOperator },

    /// The program is not on the command allow-list.
    #[error("Command '{command}' is not allowed")]
    CommandNotAllowed { command: String },

    /// A `-`-prefixed token is not on the flag allow-list.
    #[error("Flag '{flag}' is not allowed")]
    FlagNotAllowed { flag: String },

    /// A path-like argument resolves outside the root directory, or could
    /// not be resolved at all.
    #[error("Path '{path}' {reason}")]
    PathEscape { path: String, reason: String },

    /// Nothing to run after tokenization.
    #[error("Empty command")]
    EmptyCommand,

    /// Malformed quoting or a construct the validator refuses to reason about.
    #[error("Invalid command syntax: {reason}")]
    InvalidSyntax { reason: String },
}

impl Violation {
    /// Returns the category of this violation.
    pub fn kind(&self) -> ViolationKind {
        match self {
            Self::LengthExceeded { .. } => ViolationKind::LengthExceeded,
            Self::OperatorNotAllowed { .. } => ViolationKind::OperatorNotAllowed,
            Self::CommandNotAllowed { .. } => ViolationKind::CommandNotAllowed,
            Self::FlagNotAllowed { .. } => ViolationKind::FlagNotAllowed,
            Self::PathEscape { .. } => ViolationKind::PathEscape,
            Self::EmptyCommand => ViolationKind::EmptyCommand,
            Self::InvalidSyntax { .. } => ViolationKind::InvalidSyntax,
        }
    }

    pub(crate) fn invalid_syntax(reason: impl Into<String>) -> Self {
        Self::InvalidSyntax {
            reason: reason.into(),
        }
    }
}

/// Fieldless mirror of [`Violation`], handy for logging and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    LengthExceeded,
    OperatorNotAllowed,
    CommandNotAllowed,
    FlagNotAllowed,
    PathEscape,
    EmptyCommand,
    InvalidSyntax,
}

impl ViolationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LengthExceeded => "length_exceeded",
            Self::OperatorNotAllowed => "operator_not_allowed",
            Self::CommandNotAllowed => "command_not_allowed",
            Self::FlagNotAllowed => "flag_not_allowed",
            Self::PathEscape => "path_escape",
            Self::EmptyCommand => "empty_command",
            Self::InvalidSyntax => "invalid_syntax",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while turning settings into a [`crate::PolicyConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No root directory was configured.
    #[error("root directory is required (set ALLOWED_DIR or `allowed_dir`)")]
    MissingRoot,

    /// The root directory does not exist or is not a directory.
    #[error("invalid root directory '{}': {reason}", path.display())]
    InvalidRoot { path: PathBuf, reason: String },

    /// A numeric limit is out of range.
    #[error("{name} must be greater than zero")]
    InvalidLimit { name: &'static str },

    /// The settings file could not be read.
    #[error("failed to read settings file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid TOML for [`crate::PolicySettings`].
    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),
}
