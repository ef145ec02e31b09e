//! Pseudo-terminal execution.
//!
//! The supervising loop is single-threaded and cooperative. Each iteration
//! checks, in order, whether the child exited, whether the deadline passed,
//! and whether the master has data, waiting at most one poll interval on the
//! last. A hung child therefore cannot delay deadline enforcement by more
//! than one interval.
//!
//! ```text
//! SPAWNED ──▶ RUNNING ──┬──▶ EXITED      final drain, exit code
//!                       └──▶ TERMINATING ──▶ KILLED   final drain, Timeout
//! ```

use std::io::{self, Read};
use std::os::unix::io::RawFd;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use cliguard_utils_pty::{Child, CommandBuilder, MasterPty, create_pty_pair, fd};
use tracing::{debug, info, warn};

use crate::error::{ExecError, Result};
use crate::output::{ExecutionResult, OutputBuffer};
use crate::planner::ExecutionPlan;
use crate::terminate::{self, TERMINATION_GRACE, pty_exit_code};

/// Interval between supervision passes.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Runs a plan attached to a pseudo-terminal. Blocking.
#[derive(Debug, Clone)]
pub struct PtyRunner {
    cwd: PathBuf,
    timeout: Duration,
    grace: Duration,
    poll_interval: Duration,
}

impl PtyRunner {
    pub fn new(cwd: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            cwd: cwd.into(),
            timeout,
            grace: TERMINATION_GRACE,
            poll_interval: POLL_INTERVAL,
        }
    }

    /// Overrides the pause between graceful and forceful termination.
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Spawns the plan on a fresh PTY and supervises it to completion.
    ///
    /// Combined terminal output is returned as `stdout`. On timeout the
    /// output captured so far travels in the error's `partial` result.
    pub fn run(&self, plan: &ExecutionPlan) -> Result<ExecutionResult> {
        let start = Instant::now();
        let mut process = RunningProcess::spawn(plan, &self.cwd, start + self.timeout)?;
        info!(pid = process.pid, program = %plan.program.display(), "pty process spawned");

        let mut output = OutputBuffer::new();
        let mut eof = false;

        loop {
            if let Some(code) = process.try_exit()? {
                process.drain_best_effort(&mut output);
                process.release_master();

                let duration = start.elapsed();
                info!(
                    pid = process.pid,
                    exit_code = code,
                    duration_ms = duration.as_millis() as u64,
                    "pty process finished"
                );
                return Ok(ExecutionResult {
                    stdout: output.into_string(),
                    stderr: String::new(),
                    exit_code: code,
                    timed_out: false,
                    duration,
                });
            }

            if Instant::now() >= process.deadline {
                warn!(
                    pid = process.pid,
                    timeout_secs = self.timeout.as_secs(),
                    "pty process timed out, terminating"
                );
                let code = process.terminate(self.grace);
                process.drain_best_effort(&mut output);
                process.release_master();

                return Err(ExecError::Timeout {
                    timeout: self.timeout,
                    pid: process.pid,
                    partial: Some(Box::new(ExecutionResult {
                        stdout: output.into_string(),
                        stderr: String::new(),
                        exit_code: code.unwrap_or(-1),
                        timed_out: true,
                        duration: start.elapsed(),
                    })),
                });
            }

            if eof {
                // Slave side is gone; only the exit remains to be observed.
                std::thread::sleep(self.poll_interval);
                continue;
            }

            if process.wait_readable(self.poll_interval)? {
                eof = process.drain(&mut output)?;
            }
        }
    }
}

/// One PTY-attached child and the master side of its terminal.
///
/// Dropping it releases the master and kills and reaps the child if it has
/// not been reaped yet, so early returns cannot leak either.
struct RunningProcess {
    child: Box<dyn Child + Send + Sync>,
    pid: Option<u32>,
    master: Option<Box<dyn MasterPty + Send>>,
    master_fd: RawFd,
    reader: Option<Box<dyn Read + Send>>,
    deadline: Instant,
    reaped: bool,
}

impl RunningProcess {
    fn spawn(plan: &ExecutionPlan, cwd: &Path, deadline: Instant) -> Result<Self> {
        let pair =
            create_pty_pair().map_err(|e| ExecError::execution("failed to allocate pty", e))?;

        let mut cmd = CommandBuilder::new(&plan.program);
        cmd.args(&plan.args);
        cmd.cwd(cwd);

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| ExecError::execution("failed to spawn pty process", e))?;
        // The child holds its own copy of the slave.
        drop(pair.slave);

        let master_fd = pair.master.as_raw_fd().unwrap_or(-1);
        let mut process = Self {
            pid: child.process_id(),
            child,
            master: Some(pair.master),
            master_fd,
            reader: None,
            deadline,
            reaped: false,
        };

        if process.master_fd < 0 {
            return Err(ExecError::execution(
                "failed to prepare pty",
                "master has no file descriptor",
            ));
        }
        fd::set_nonblocking(process.master_fd)
            .map_err(|e| ExecError::execution("failed to prepare pty", e))?;
        let reader = process
            .master
            .as_ref()
            .map(|master| master.try_clone_reader())
            .transpose()
            .map_err(|e| ExecError::execution("failed to prepare pty", e))?;
        process.reader = reader;

        Ok(process)
    }

    fn try_exit(&mut self) -> Result<Option<i32>> {
        match self.child.try_wait() {
            Ok(Some(status)) => {
                self.reaped = true;
                Ok(Some(pty_exit_code(&status)))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(ExecError::execution("failed to poll pty process", e)),
        }
    }

    fn wait_readable(&self, timeout: Duration) -> Result<bool> {
        if self.master.is_none() {
            return Ok(false);
        }
        fd::wait_readable(self.master_fd, timeout)
            .map_err(|e| ExecError::execution("failed to poll pty", e))
    }

    /// Reads everything currently available. Returns `true` at EOF.
    fn drain(&mut self, output: &mut OutputBuffer) -> Result<bool> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(true);
        };

        let mut chunk = [0u8; 4096];
        loop {
            match reader.read(&mut chunk) {
                Ok(0) => return Ok(true),
                Ok(n) => output.push(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(false),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                // Linux reports a closed slave as EIO.
                Err(e) if e.raw_os_error() == Some(libc::EIO) => return Ok(true),
                Err(e) => return Err(ExecError::execution("failed to read pty", e)),
            }
        }
    }

    fn drain_best_effort(&mut self, output: &mut OutputBuffer) {
        if let Err(e) = self.drain(output) {
            debug!(pid = self.pid, error = %e, "final pty drain failed");
        }
    }

    /// Escalates termination and reaps. Returns the reaped exit code.
    fn terminate(&mut self, grace: Duration) -> Option<i32> {
        let (outcome, code) = terminate::escalate_blocking(self.child.as_mut(), self.pid, grace);
        debug!(pid = self.pid, ?outcome, "pty process terminated");
        self.reaped = true;
        code
    }

    fn release_master(&mut self) {
        self.reader = None;
        self.master = None;
    }
}

impl Drop for RunningProcess {
    fn drop(&mut self) {
        if !self.reaped {
            if let Err(e) = self.child.kill() {
                debug!(pid = self.pid, error = %e, "kill on drop failed");
            }
            if let Err(e) = self.child.wait() {
                warn!(pid = self.pid, error = %e, "failed to reap pty process on drop");
            }
        }
        self.release_master();
    }
}
