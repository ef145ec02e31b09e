//! Execution planning: which back end runs a validated command, and how.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use cliguard_execpolicy::{ValidatedCommand, Violation};
use cliguard_utils_pty::{detect_shell, supports_login};

/// Back end used for an execution. Chosen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExecutionMode {
    /// Plain child process with separate stdout and stderr pipes.
    #[default]
    Shell,
    /// Child attached to a pseudo-terminal, for programs that need one.
    Pty,
}

impl ExecutionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Shell => "shell",
            Self::Pty => "pty",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "shell" => Ok(Self::Shell),
            "pty" => Ok(Self::Pty),
            other => Err(format!("unknown execution mode: {other}")),
        }
    }
}

/// The shell that command text is handed to with `-c`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellInvocation {
    program: PathBuf,
    login: bool,
}

impl ShellInvocation {
    pub fn new(program: impl Into<PathBuf>, login: bool) -> Self {
        Self {
            program: program.into(),
            login,
        }
    }

    /// Probes the usual shells; zsh is run as a login shell.
    pub fn detect() -> Self {
        let program = detect_shell();
        let login = supports_login(&program);
        Self { program, login }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn login(&self) -> bool {
        self.login
    }

    /// Arguments that make the shell run `text`.
    pub fn args_for(&self, text: &str) -> Vec<String> {
        let mut args = Vec::with_capacity(3);
        if self.login {
            args.push("-l".to_string());
        }
        args.push("-c".to_string());
        args.push(text.to_string());
        args
    }
}

/// Everything a runner needs to start a process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    pub mode: ExecutionMode,
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Text the shell will parse.
    pub text: String,
}

/// Shell text for a validated command.
///
/// Composite commands are used verbatim. Simple commands are re-quoted so
/// arguments reach the program exactly as validated.
pub fn shell_text(command: &ValidatedCommand) -> Result<String, Violation> {
    match command {
        ValidatedCommand::Composite { text } => Ok(text.clone()),
        ValidatedCommand::Simple { program, args } => {
            let words = std::iter::once(program.as_str()).chain(args.iter().map(String::as_str));
            shlex::try_join(words).map_err(|e| Violation::InvalidSyntax {
                reason: e.to_string(),
            })
        }
    }
}

/// Builds the plan for running `command` in `mode` through `shell`.
pub fn plan(
    command: &ValidatedCommand,
    mode: ExecutionMode,
    shell: &ShellInvocation,
) -> Result<ExecutionPlan, Violation> {
    let text = shell_text(command)?;
    Ok(ExecutionPlan {
        mode,
        program: shell.program().to_path_buf(),
        args: shell.args_for(&text),
        text,
    })
}
