//! Plain child-process execution.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{ExecError, Result};
use crate::output::{ExecutionResult, OutputBuffer, exit_code};
use crate::planner::ExecutionPlan;
use crate::terminate::{self, TERMINATION_GRACE};

/// Runs a plan as a plain child with piped stdout and stderr.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    cwd: PathBuf,
    timeout: Duration,
    grace: Duration,
}

impl ProcessRunner {
    pub fn new(cwd: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            cwd: cwd.into(),
            timeout,
            grace: TERMINATION_GRACE,
        }
    }

    /// Overrides the pause between graceful and forceful termination.
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Spawns the plan and waits for it, up to the timeout.
    ///
    /// On timeout the child's process group is terminated and reaped before
    /// [`ExecError::Timeout`] is returned; output read so far is discarded.
    pub async fn run(&self, plan: &ExecutionPlan) -> Result<ExecutionResult> {
        let start = Instant::now();

        let mut cmd = Command::new(&plan.program);
        cmd.args(&plan.args)
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true); // Clean up child process if we're dropped

        // Unix-specific: set up process group isolation
        #[cfg(unix)]
        {
            // SAFETY: setpgid only changes process group, no undefined behavior
            unsafe {
                cmd.pre_exec(|| {
                    // Own group so termination reaches everything the shell forks
                    if libc::setpgid(0, 0) == -1 {
                        return Err(std::io::Error::last_os_error());
                    }
                    Ok(())
                });
            }
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| ExecError::execution("failed to spawn process", e))?;
        let pid = child.id();
        info!(pid, program = %plan.program.display(), "process spawned");

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let result = tokio::time::timeout(self.timeout, async {
            let (stdout, stderr, status) =
                tokio::join!(read_stream(stdout), read_stream(stderr), child.wait());
            (stdout, stderr, status)
        })
        .await;

        let duration = start.elapsed();

        match result {
            Ok((stdout, stderr, status)) => {
                let status =
                    status.map_err(|e| ExecError::execution("failed to wait for process", e))?;
                let stdout = stdout.map_err(|e| ExecError::execution("failed to read stdout", e))?;
                let stderr = stderr.map_err(|e| ExecError::execution("failed to read stderr", e))?;

                let exit_code = exit_code(status);
                info!(pid, exit_code, duration_ms = duration.as_millis() as u64, "process finished");

                Ok(ExecutionResult {
                    stdout: stdout.into_string(),
                    stderr: stderr.into_string(),
                    exit_code,
                    timed_out: false,
                    duration,
                })
            }
            Err(_) => {
                warn!(pid, timeout_secs = self.timeout.as_secs(), "process timed out, terminating");
                let outcome = terminate::escalate(&mut child, pid, self.grace).await;
                debug!(pid, ?outcome, "process terminated");

                Err(ExecError::Timeout {
                    timeout: self.timeout,
                    pid,
                    partial: None,
                })
            }
        }
    }
}

async fn read_stream<R>(stream: Option<R>) -> std::io::Result<OutputBuffer>
where
    R: AsyncRead + Unpin,
{
    let mut buffer = OutputBuffer::new();
    let Some(mut stream) = stream else {
        return Ok(buffer);
    };

    let mut chunk = [0u8; 8192];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(buffer);
        }
        buffer.push(&chunk[..n]);
    }
}
