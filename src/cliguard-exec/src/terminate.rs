//! Graceful-then-forceful termination of a child's process group.
//!
//! Children are started as group leaders, so signalling `-pid` also reaches
//! anything the shell forked. Every step is best-effort: failures are logged
//! and the caller always goes on to reap the child.

#[cfg(unix)]
use std::ffi::CStr;
use std::time::{Duration, Instant};

use cliguard_utils_pty::{Child, ExitStatus};
use tracing::{debug, warn};

use crate::output::EXIT_CODE_SIGNAL_BASE;

/// Time between the graceful signal and the forceful one.
pub const TERMINATION_GRACE: Duration = Duration::from_millis(200);

const REAP_POLL: Duration = Duration::from_millis(10);

/// Highest signal number searched when decoding a PTY exit status.
#[cfg(unix)]
const MAX_SIGNAL: libc::c_int = 64;

/// How a terminated child went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escalation {
    /// Exited within the grace period after the graceful signal.
    Terminated,
    /// Needed the forceful kill.
    Killed,
}

#[cfg(unix)]
fn signal_group(pid: u32, signal: libc::c_int) -> bool {
    let Ok(pgid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    // SAFETY: kill(2) has no memory-safety preconditions.
    let rc = unsafe { libc::kill(-pgid, signal) };
    if rc == -1 {
        debug!(
            pid,
            signal,
            error = %std::io::Error::last_os_error(),
            "failed to signal process group"
        );
    }
    rc == 0
}

/// Sends the graceful termination signal to the group led by `pid`.
pub fn request_termination(pid: u32) -> bool {
    #[cfg(unix)]
    {
        signal_group(pid, libc::SIGTERM)
    }
    #[cfg(not(unix))]
    {
        let _ = pid;
        false
    }
}

/// Sends the forceful kill signal to the group led by `pid`.
pub fn force_kill(pid: u32) -> bool {
    #[cfg(unix)]
    {
        signal_group(pid, libc::SIGKILL)
    }
    #[cfg(not(unix))]
    {
        let _ = pid;
        false
    }
}

/// Whether `pid` can still be signalled (running or not yet reaped).
#[cfg(unix)]
pub fn is_alive(pid: u32) -> bool {
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    // SAFETY: signal 0 only performs the existence and permission check.
    unsafe { libc::kill(pid, 0) == 0 }
}

/// Escalates against a tokio child and reaps it.
pub async fn escalate(
    child: &mut tokio::process::Child,
    pid: Option<u32>,
    grace: Duration,
) -> Escalation {
    if let Some(pid) = pid {
        request_termination(pid);
        if tokio::time::timeout(grace, child.wait()).await.is_ok() {
            return Escalation::Terminated;
        }
        warn!(pid, "process still alive after grace period, killing");
        force_kill(pid);
    }

    // kill() also reaps.
    if let Err(e) = child.kill().await {
        debug!(error = %e, "kill after escalation failed");
    }
    Escalation::Killed
}

/// Escalates against a PTY child and reaps it.
///
/// Returns the exit code observed when reaping, if any.
pub fn escalate_blocking(
    child: &mut dyn Child,
    pid: Option<u32>,
    grace: Duration,
) -> (Escalation, Option<i32>) {
    if let Some(pid) = pid {
        request_termination(pid);
        let deadline = Instant::now() + grace;
        loop {
            if let Ok(Some(status)) = child.try_wait() {
                return (Escalation::Terminated, Some(pty_exit_code(&status)));
            }
            if Instant::now() >= deadline {
                break;
            }
            std::thread::sleep(REAP_POLL);
        }
        warn!(pid, "process still alive after grace period, killing");
        if !force_kill(pid) {
            let _ = child.kill();
        }
    } else if let Err(e) = child.kill() {
        debug!(error = %e, "kill after escalation failed");
    }

    match child.wait() {
        Ok(status) => (Escalation::Killed, Some(pty_exit_code(&status))),
        Err(e) => {
            warn!(error = %e, "failed to reap terminated process");
            (Escalation::Killed, None)
        }
    }
}

/// Maps a PTY child's exit status to the same shell-style code the pipe
/// path reports: `128 + signal` for a signal death.
///
/// portable-pty records a signal death as code 1 plus the `strsignal(3)`
/// description, so the description is mapped back to its number.
pub(crate) fn pty_exit_code(status: &ExitStatus) -> i32 {
    if let Some(signal) = status.signal().and_then(signal_number) {
        return EXIT_CODE_SIGNAL_BASE + signal;
    }
    i32::try_from(status.exit_code()).unwrap_or(i32::MAX)
}

#[cfg(unix)]
fn signal_number(description: &str) -> Option<i32> {
    if let Some(number) = description.strip_prefix("Signal ") {
        return number.parse().ok();
    }
    (1..=MAX_SIGNAL).find(|&signal| {
        // SAFETY: strsignal returns null or a NUL-terminated string that stays
        // valid until the next call on this thread; it is copied before that.
        let name = unsafe { libc::strsignal(signal) };
        !name.is_null() && unsafe { CStr::from_ptr(name) }.to_string_lossy() == description
    })
}

#[cfg(not(unix))]
fn signal_number(_description: &str) -> Option<i32> {
    None
}
