//! Execution results and output capture.

use std::time::Duration;

/// Per-stream cap on captured output.
pub const MAX_OUTPUT_SIZE: usize = 1024 * 1024;

/// Exit codes for signal-terminated children start here (`128 + signal`).
pub const EXIT_CODE_SIGNAL_BASE: i32 = 128;

/// Outcome of one completed execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub stdout: String,
    /// Always empty on the PTY path, where both streams share the terminal.
    pub stderr: String,
    pub exit_code: i32,
    /// Set only on the partial result attached to a timeout.
    pub timed_out: bool,
    pub duration: Duration,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0 && !self.timed_out
    }
}

/// Bounded byte sink for one output stream.
///
/// Bytes past [`MAX_OUTPUT_SIZE`] are counted but not kept.
#[derive(Debug, Default)]
pub(crate) struct OutputBuffer {
    bytes: Vec<u8>,
    total: usize,
}

impl OutputBuffer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, chunk: &[u8]) {
        self.total += chunk.len();
        let room = MAX_OUTPUT_SIZE.saturating_sub(self.bytes.len());
        self.bytes.extend_from_slice(&chunk[..chunk.len().min(room)]);
    }

    /// Decodes permissively, replacing invalid sequences, and appends a
    /// marker if anything was dropped.
    pub(crate) fn into_string(self) -> String {
        let mut text = String::from_utf8_lossy(&self.bytes).into_owned();
        if self.total > self.bytes.len() {
            text.push_str(&format!(
                "...\n[Output truncated, {} bytes total]",
                self.total
            ));
        }
        text
    }
}

/// Maps a process exit status to a shell-style exit code.
pub(crate) fn exit_code(status: std::process::ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return EXIT_CODE_SIGNAL_BASE + signal;
        }
    }

    -1
}
