//! Error types for command execution.

use std::fmt;
use std::time::Duration;

use cliguard_execpolicy::Violation;
use thiserror::Error;

use crate::output::ExecutionResult;

/// Why an execution did not produce a normal result.
///
/// A non-zero exit code is not an error; it is reported in
/// [`ExecutionResult::exit_code`].
#[derive(Debug, Error)]
pub enum ExecError {
    /// Rejected by the policy before anything was spawned.
    #[error("Security violation: {0}")]
    Security(#[from] Violation),

    /// Spawning, PTY allocation or supervision I/O failed.
    #[error("{context}: {message}")]
    Execution {
        context: &'static str,
        message: String,
    },

    /// The command outlived its deadline and was terminated.
    #[error("Command timed out after {} seconds", .timeout.as_secs())]
    Timeout {
        timeout: Duration,
        /// Process id of the terminated child, if it was known.
        pid: Option<u32>,
        /// Output captured before termination, when the runner keeps it.
        partial: Option<Box<ExecutionResult>>,
    },
}

impl ExecError {
    /// Wraps an OS-level error with what was being attempted.
    pub fn execution(context: &'static str, error: impl fmt::Display) -> Self {
        Self::Execution {
            context,
            message: error.to_string(),
        }
    }

    pub fn violation(&self) -> Option<&Violation> {
        match self {
            Self::Security(violation) => Some(violation),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Result type for execution operations.
pub type Result<T> = std::result::Result<T, ExecError>;
