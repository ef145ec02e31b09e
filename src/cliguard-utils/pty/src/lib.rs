//! PTY and shell utilities for cliguard.
//!
//! This crate wraps `portable-pty` for the pseudo-terminal execution path and
//! knows how to pick the shell that command lines are handed to.
//!
//! # Platform Support
//!
//! - **Linux / macOS**: native PTY, plus the descriptor helpers in [`fd`]
//! - **Windows**: PTY allocation via ConPTY; descriptor helpers unavailable
//!
//! # Example
//!
//! ```ignore
//! use cliguard_utils_pty::{create_pty_pair, CommandBuilder};
//!
//! let pair = create_pty_pair()?;
//! let mut cmd = CommandBuilder::new("/bin/sh");
//! cmd.args(["-c", "ls"]);
//! cmd.cwd("/srv/data");
//! let child = pair.slave.spawn_command(cmd)?;
//! ```

use std::path::{Path, PathBuf};

// Re-export core types from portable-pty for convenient access
pub use portable_pty::{
    native_pty_system, Child, CommandBuilder, ExitStatus, MasterPty, PtyPair, PtySize,
    PtySystem, SlavePty,
};

/// Default terminal width in columns.
pub const DEFAULT_COLS: u16 = 120;

/// Default terminal height in rows.
pub const DEFAULT_ROWS: u16 = 30;

/// Shells probed by [`detect_shell`], most capable first.
pub const SHELL_PREFERENCE: [&str; 3] = ["/bin/zsh", "/bin/bash", "/bin/sh"];

/// Last-resort shell when nothing else is found.
pub const FALLBACK_SHELL: &str = "/bin/sh";

/// Default PTY size with standard dimensions.
#[must_use]
pub fn default_pty_size() -> PtySize {
    PtySize {
        rows: DEFAULT_ROWS,
        cols: DEFAULT_COLS,
        pixel_width: 0,
        pixel_height: 0,
    }
}

/// Creates a new PTY pair with default size.
///
/// # Errors
///
/// Returns an error if the PTY cannot be created, which may happen if:
/// - The system doesn't support PTY operations
/// - Resource limits have been reached
pub fn create_pty_pair() -> anyhow::Result<PtyPair> {
    let pty_system = native_pty_system();
    pty_system
        .openpty(default_pty_size())
        .map_err(|e| anyhow::anyhow!("Failed to open PTY: {}", e))
}

/// Picks the shell used to run command lines.
///
/// Probes [`SHELL_PREFERENCE`] in order, then falls back to `SHELL`, then to
/// [`FALLBACK_SHELL`].
#[must_use]
pub fn detect_shell() -> PathBuf {
    let candidates: Vec<&Path> = SHELL_PREFERENCE.iter().map(Path::new).collect();
    detect_shell_from(&candidates, std::env::var("SHELL").ok())
}

/// [`detect_shell`] with explicit inputs.
#[must_use]
pub fn detect_shell_from(candidates: &[&Path], configured: Option<String>) -> PathBuf {
    candidates
        .iter()
        .find(|path| path.is_file())
        .map(|path| path.to_path_buf())
        .or_else(|| configured.filter(|s| !s.is_empty()).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(FALLBACK_SHELL))
}

/// Whether `shell` is invoked with `-l` so login profiles are sourced.
#[must_use]
pub fn supports_login(shell: &Path) -> bool {
    shell.file_name().and_then(|name| name.to_str()) == Some("zsh")
}

/// Raw descriptor helpers for polling a PTY master.
#[cfg(unix)]
pub mod fd {
    use std::io;
    use std::os::unix::io::RawFd;
    use std::time::Duration;

    /// Sets `O_NONBLOCK` on `fd`.
    pub fn set_nonblocking(fd: RawFd) -> io::Result<()> {
        // SAFETY: fcntl with F_GETFL/F_SETFL only reads and writes the status
        // flags of a descriptor the caller owns.
        unsafe {
            let flags = libc::fcntl(fd, libc::F_GETFL);
            if flags < 0 {
                return Err(io::Error::last_os_error());
            }
            if libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) < 0 {
                return Err(io::Error::last_os_error());
            }
        }
        Ok(())
    }

    /// Waits up to `timeout` for `fd` to become readable.
    ///
    /// Returns `true` when a read will not block. Hang-up counts as readable
    /// so the caller observes EOF.
    pub fn wait_readable(fd: RawFd, timeout: Duration) -> io::Result<bool> {
        let mut pollfd = libc::pollfd {
            fd,
            events: libc::POLLIN,
            revents: 0,
        };
        let millis = libc::c_int::try_from(timeout.as_millis()).unwrap_or(libc::c_int::MAX);

        // SAFETY: pollfd is a valid, exclusively borrowed array of length 1.
        let ready = unsafe { libc::poll(&mut pollfd, 1, millis) };
        if ready < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(false);
            }
            return Err(err);
        }
        Ok(ready > 0 && pollfd.revents & (libc::POLLIN | libc::POLLHUP | libc::POLLERR) != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pty_size() {
        let size = default_pty_size();
        assert_eq!(size.cols, DEFAULT_COLS);
        assert_eq!(size.rows, DEFAULT_ROWS);
        assert_eq!(size.pixel_width, 0);
        assert_eq!(size.pixel_height, 0);
    }

    #[test]
    fn test_detect_shell_prefers_first_existing() {
        let dir = tempfile::TempDir::new().unwrap();
        let bash = dir.path().join("bash");
        let sh = dir.path().join("sh");
        std::fs::write(&bash, "").unwrap();
        std::fs::write(&sh, "").unwrap();
        let zsh = dir.path().join("zsh");

        let candidates = [zsh.as_path(), bash.as_path(), sh.as_path()];
        assert_eq!(detect_shell_from(&candidates, None), bash);
    }

    #[test]
    fn test_detect_shell_falls_back() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("missing");
        let candidates = [missing.as_path()];

        assert_eq!(
            detect_shell_from(&candidates, Some("/usr/local/bin/fish".to_string())),
            PathBuf::from("/usr/local/bin/fish")
        );
        assert_eq!(
            detect_shell_from(&candidates, Some(String::new())),
            PathBuf::from(FALLBACK_SHELL)
        );
        assert_eq!(
            detect_shell_from(&candidates, None),
            PathBuf::from(FALLBACK_SHELL)
        );
    }

    #[test]
    fn test_detect_shell_not_empty() {
        assert!(!detect_shell().as_os_str().is_empty());
    }

    #[test]
    fn test_supports_login() {
        assert!(supports_login(Path::new("/bin/zsh")));
        assert!(supports_login(Path::new("/usr/local/bin/zsh")));
        assert!(!supports_login(Path::new("/bin/bash")));
        assert!(!supports_login(Path::new("/bin/sh")));
    }

    #[cfg(unix)]
    #[test]
    fn test_wait_readable_on_pipe() {
        use std::time::Duration;

        let mut fds = [0 as libc::c_int; 2];
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
        let (read_fd, write_fd) = (fds[0], fds[1]);

        fd::set_nonblocking(read_fd).unwrap();
        assert!(!fd::wait_readable(read_fd, Duration::from_millis(10)).unwrap());

        let byte = b"x";
        assert_eq!(
            unsafe { libc::write(write_fd, byte.as_ptr().cast(), 1) },
            1
        );
        assert!(fd::wait_readable(read_fd, Duration::from_millis(10)).unwrap());

        unsafe {
            libc::close(read_fd);
            libc::close(write_fd);
        }
    }
}
