//! Cliguard Exec - run policy-checked command lines with a deadline.
//!
//! Every call goes validate → plan → run → collect:
//! - validation is delegated to `cliguard-execpolicy`; nothing is spawned
//!   for a rejected command
//! - the plan hands the command text to the detected shell with `-c`
//! - the run uses either piped stdio or a pseudo-terminal, as the caller asks
//!
//! # Execution Modes
//!
//! - `ExecutionMode::Shell` - stdout and stderr captured separately (default)
//! - `ExecutionMode::Pty` - child attached to a terminal, combined output
//!
//! On timeout the child's process group receives SIGTERM, then SIGKILL after
//! a short grace period, and is reaped before the error is returned.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cliguard_exec::CommandExecutor;
//! use cliguard_execpolicy::PolicySettings;
//!
//! let policy = PolicySettings::for_root("/srv/data").into_config()?;
//! let executor = CommandExecutor::new(Arc::new(policy));
//! let result = executor.execute("ls -l").await?;
//! println!("exit {}: {}", result.exit_code, result.stdout);
//! ```

mod engine;
mod error;
mod output;
mod planner;
#[cfg(unix)]
mod pty_runner;
mod runner;
pub mod terminate;

#[cfg(test)]
mod tests;

pub use engine::CommandExecutor;
pub use error::{ExecError, Result};
pub use output::{EXIT_CODE_SIGNAL_BASE, ExecutionResult, MAX_OUTPUT_SIZE};
pub use planner::{ExecutionMode, ExecutionPlan, ShellInvocation, plan, shell_text};
#[cfg(unix)]
pub use pty_runner::{POLL_INTERVAL, PtyRunner};
pub use runner::ProcessRunner;
