//! Command validation against a [`PolicyConfig`].

use tracing::debug;

use crate::command::ValidatedCommand;
use crate::config::PolicyConfig;
use crate::error::Violation;
use crate::operators::{self, Item};
use crate::path::{PathResolver, is_path_like};

/// Checks raw command strings against a policy.
#[derive(Debug, Clone, Copy)]
pub struct CommandValidator<'a> {
    config: &'a PolicyConfig,
    resolver: PathResolver<'a>,
}

impl<'a> CommandValidator<'a> {
    pub fn new(config: &'a PolicyConfig) -> Self {
        Self {
            config,
            resolver: PathResolver::new(config.root_dir()),
        }
    }

    /// Validates an untrusted command line.
    ///
    /// The length limit, counted in characters, is enforced before anything
    /// else looks at the text.
    pub fn validate(&self, raw: &str) -> Result<ValidatedCommand, Violation> {
        let max = self.config.max_command_length();
        let length = raw.chars().count();
        if length > max {
            return Err(Violation::LengthExceeded { length, max });
        }

        let Some(first) = operators::find_first_operator(raw) else {
            return self.validate_single(raw);
        };

        if !self.config.allow_shell_operators() {
            return Err(Violation::OperatorNotAllowed { operator: first });
        }

        let items = operators::split_segments(raw)?;
        if !items.iter().any(|item| matches!(item, Item::Operator(_))) {
            // Operator characters only appeared inside quotes.
            return self.validate_single(raw);
        }

        let mut segments = 0usize;
        for item in &items {
            if let Item::Segment(text) = item {
                self.validate_single(text)?;
                segments += 1;
            }
        }
        if segments == 0 {
            return Err(Violation::EmptyCommand);
        }

        debug!(segments, "composite command accepted");
        Ok(ValidatedCommand::Composite {
            text: raw.to_string(),
        })
    }

    /// Tokenizes and validates one program invocation.
    pub fn validate_single(&self, text: &str) -> Result<ValidatedCommand, Violation> {
        let tokens = shlex::split(text)
            .ok_or_else(|| Violation::invalid_syntax("unbalanced quotes or dangling escape"))?;

        let mut tokens = tokens.into_iter();
        let program = tokens.next().ok_or(Violation::EmptyCommand)?;
        if !self.config.allowed_commands().admits(&program) {
            return Err(Violation::CommandNotAllowed { command: program });
        }

        let args = tokens
            .map(|token| self.check_argument(token))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ValidatedCommand::Simple { program, args })
    }

    fn check_argument(&self, token: String) -> Result<String, Violation> {
        if token.starts_with('-') {
            if !self.config.allowed_flags().admits(&token) {
                return Err(Violation::FlagNotAllowed { flag: token });
            }
            return self.check_flag_value(token);
        }

        if is_path_like(&token) || self.resolver.names_symlink(&token) {
            return self.resolver.resolve(&token);
        }

        Ok(token)
    }

    /// `--name=value` flags carry their own path; confine it too.
    fn check_flag_value(&self, flag: String) -> Result<String, Violation> {
        if !flag.starts_with("--") {
            return Ok(flag);
        }
        let Some((name, value)) = flag.split_once('=') else {
            return Ok(flag);
        };
        if !is_path_like(value) {
            return Ok(flag);
        }
        let resolved = self.resolver.resolve(value)?;
        Ok(format!("{name}={resolved}"))
    }
}
