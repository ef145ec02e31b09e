//! The command executor: validate, plan, run.

use std::sync::Arc;
use std::time::Duration;

use cliguard_execpolicy::{CommandValidator, PolicyConfig, PolicySummary, ValidatedCommand, Violation};
use tracing::{debug, info, warn};

use crate::error::{ExecError, Result};
use crate::output::ExecutionResult;
use crate::planner::{self, ExecutionMode, ShellInvocation};
use crate::runner::ProcessRunner;
use crate::terminate::TERMINATION_GRACE;

/// Runs untrusted command lines under a fixed policy.
///
/// Holds only read-only state, so one executor can be shared behind an
/// [`Arc`] by any number of concurrent callers. Each call owns its own child
/// process, descriptors and buffers.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    policy: Arc<PolicyConfig>,
    shell: ShellInvocation,
    default_mode: ExecutionMode,
    grace: Duration,
}

impl CommandExecutor {
    /// Creates an executor, detecting the shell once.
    pub fn new(policy: Arc<PolicyConfig>) -> Self {
        Self::with_shell(policy, ShellInvocation::detect())
    }

    /// Creates an executor that uses `shell`.
    pub fn with_shell(policy: Arc<PolicyConfig>, shell: ShellInvocation) -> Self {
        debug!(
            shell = %shell.program().display(),
            login = shell.login(),
            root = %policy.root_dir().display(),
            "command executor ready"
        );
        Self {
            policy,
            shell,
            default_mode: ExecutionMode::default(),
            grace: TERMINATION_GRACE,
        }
    }

    /// Mode used by [`CommandExecutor::execute`].
    pub fn with_default_mode(mut self, mode: ExecutionMode) -> Self {
        self.default_mode = mode;
        self
    }

    /// Pause between graceful and forceful termination on timeout.
    pub fn with_termination_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    pub fn shell(&self) -> &ShellInvocation {
        &self.shell
    }

    pub fn default_mode(&self) -> ExecutionMode {
        self.default_mode
    }

    /// Human-readable view of the active policy.
    pub fn summary(&self) -> PolicySummary {
        PolicySummary::from_config(&self.policy)
    }

    /// Validates without running.
    pub fn validate(&self, raw: &str) -> std::result::Result<ValidatedCommand, Violation> {
        CommandValidator::new(&self.policy).validate(raw)
    }

    /// Validates and runs `raw` in the default mode.
    pub async fn execute(&self, raw: &str) -> Result<ExecutionResult> {
        self.execute_with_mode(raw, self.default_mode).await
    }

    /// Validates and runs `raw` in `mode`.
    ///
    /// Nothing is spawned unless validation succeeds.
    pub async fn execute_with_mode(&self, raw: &str, mode: ExecutionMode) -> Result<ExecutionResult> {
        let validated = self.validate(raw).inspect_err(|violation| {
            warn!(kind = %violation.kind(), "command rejected: {violation}");
        })?;

        let plan = planner::plan(&validated, mode, &self.shell)?;
        info!(%mode, composite = validated.is_composite(), "executing command");

        let root = self.policy.root_dir().to_path_buf();
        let timeout = self.policy.command_timeout();

        let result = match mode {
            ExecutionMode::Shell => {
                ProcessRunner::new(root, timeout)
                    .with_grace(self.grace)
                    .run(&plan)
                    .await
            }
            ExecutionMode::Pty => self.run_pty(root, timeout, plan).await,
        };

        if let Err(e) = &result {
            warn!(%mode, "command failed: {e}");
        }
        result
    }

    #[cfg(unix)]
    async fn run_pty(
        &self,
        root: std::path::PathBuf,
        timeout: Duration,
        plan: planner::ExecutionPlan,
    ) -> Result<ExecutionResult> {
        let runner = crate::pty_runner::PtyRunner::new(root, timeout).with_grace(self.grace);
        tokio::task::spawn_blocking(move || runner.run(&plan))
            .await
            .map_err(|e| ExecError::execution("pty supervisor task failed", e))?
    }

    #[cfg(not(unix))]
    async fn run_pty(
        &self,
        _root: std::path::PathBuf,
        _timeout: Duration,
        _plan: planner::ExecutionPlan,
    ) -> Result<ExecutionResult> {
        Err(ExecError::execution(
            "pty execution unavailable",
            "pseudo-terminal mode requires a Unix platform",
        ))
    }
}
