#![allow(
    clippy::missing_errors_doc,
    clippy::uninlined_format_args,
    clippy::doc_markdown
)]
//! Cliguard Execpolicy - allow-list and confinement policy for command lines.
//!
//! This crate decides whether an untrusted command line may run:
//! - the program must be on the command allow-list
//! - every `-`-prefixed token must be on the flag allow-list
//! - every path-like argument must resolve inside the root directory
//! - shell operators are rejected unless the policy enables them
//!
//! Nothing here spawns processes; see `cliguard-exec` for that.
//!
//! # Validation Flow
//!
//! ```text
//! ┌────────────────────────────────────────────┐
//! │              Raw command                   │
//! └────────────────────┬───────────────────────┘
//!                      │
//!                      ▼
//! ┌────────────────────────────────────────────┐
//! │     Longer than max_command_length?        │──[Yes]──▶ LengthExceeded
//! └────────────────────┬───────────────────────┘
//!                      │ [No]
//!                      ▼
//! ┌────────────────────────────────────────────┐
//! │     Contains &&, ||, |, >>, >, <<, <, ; ?  │
//! └────────────────────┬───────────────────────┘
//!                      │
//!        ┌─────────────┴─────────────┐
//!        ▼                           ▼
//!      [Yes]                        [No]
//!        │                           │
//!        ▼                           ▼
//!  operators enabled?        ┌─────────────────┐
//!    │         │             │ Simple command  │
//!  [No]      [Yes]           │ program, flags, │
//!    │         │             │ paths checked   │
//!    ▼         ▼             └─────────────────┘
//! OperatorNot  split into segments,
//! Allowed      check each as Simple,
//!              keep text verbatim ──▶ Composite
//! ```


mod command;
mod config;
mod error;
mod operators;
mod path;
mod summary;
mod validator;

// Re-export all public types
pub use command::ValidatedCommand;
pub use config::{
    AllowList, DEFAULT_ALLOWED_COMMANDS, DEFAULT_ALLOWED_FLAGS, DEFAULT_COMMAND_TIMEOUT_SECS,
    DEFAULT_MAX_COMMAND_LENGTH, PolicyConfig, PolicySettings, parse_toggle,
};
pub use error::{ConfigError, Violation, ViolationKind};
pub use operators::{Item, ShellOperator, find_first_operator, split_segments};
pub use path::{PathResolver, is_path_like, is_url};
pub use summary::PolicySummary;
pub use validator::CommandValidator;

// ============================================================================
// Convenience Functions
// ============================================================================

/// Validates `raw` against `config`.
pub fn validate(config: &PolicyConfig, raw: &str) -> Result<ValidatedCommand, Violation> {
    CommandValidator::new(config).validate(raw)
}
