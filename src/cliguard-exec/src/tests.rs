//! Unit tests for planning, output capture and error rendering.

use std::time::Duration;

use cliguard_execpolicy::{ValidatedCommand, Violation};
use pretty_assertions::assert_eq;

use super::*;
use crate::output::{OutputBuffer, exit_code};
use crate::terminate::pty_exit_code;

fn simple(program: &str, args: &[&str]) -> ValidatedCommand {
    ValidatedCommand::Simple {
        program: program.to_string(),
        args: args.iter().map(|s| s.to_string()).collect(),
    }
}

// ============================================================================
// Planner Tests
// ============================================================================

mod planner_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_shell_text_requotes_simple() {
        let command = simple("cat", &["two words", "it's", "$HOME", "a;b"]);
        let text = shell_text(&command).unwrap();
        assert_eq!(
            shlex::split(&text).unwrap(),
            vec!["cat", "two words", "it's", "$HOME", "a;b"]
        );
    }

    #[test]
    fn test_shell_text_plain_words_unquoted() {
        let text = shell_text(&simple("ls", &["-l", "notes.txt"])).unwrap();
        assert_eq!(text, "ls -l notes.txt");
    }

    #[test]
    fn test_shell_text_composite_verbatim() {
        let raw = "ls -l  |  cat notes.txt";
        let command = ValidatedCommand::Composite {
            text: raw.to_string(),
        };
        assert_eq!(shell_text(&command).unwrap(), raw);
    }

    #[test]
    fn test_shell_text_rejects_nul() {
        let err = shell_text(&simple("cat", &["a\0b"])).unwrap_err();
        assert!(matches!(err, Violation::InvalidSyntax { .. }));
    }

    #[test]
    fn test_plan_plain_shell() {
        let shell = ShellInvocation::new("/bin/sh", false);
        let plan = plan(&simple("ls", &[]), ExecutionMode::Shell, &shell).unwrap();
        assert_eq!(
            plan,
            ExecutionPlan {
                mode: ExecutionMode::Shell,
                program: "/bin/sh".into(),
                args: vec!["-c".to_string(), "ls".to_string()],
                text: "ls".to_string(),
            }
        );
    }

    #[test]
    fn test_plan_login_shell() {
        let shell = ShellInvocation::new("/bin/zsh", true);
        let plan = plan(&simple("pwd", &[]), ExecutionMode::Pty, &shell).unwrap();
        assert_eq!(plan.mode, ExecutionMode::Pty);
        assert_eq!(plan.args, vec!["-l", "-c", "pwd"]);
    }

    #[test]
    fn test_detected_shell_login_only_for_zsh() {
        let shell = ShellInvocation::detect();
        let is_zsh = shell.program().file_name().and_then(|n| n.to_str()) == Some("zsh");
        assert_eq!(shell.login(), is_zsh);
    }

    #[test]
    fn test_execution_mode_parse() {
        assert_eq!("shell".parse::<ExecutionMode>().unwrap(), ExecutionMode::Shell);
        assert_eq!("PTY".parse::<ExecutionMode>().unwrap(), ExecutionMode::Pty);
        assert!("tty".parse::<ExecutionMode>().is_err());
        assert_eq!(ExecutionMode::default(), ExecutionMode::Shell);
        assert_eq!(ExecutionMode::Pty.to_string(), "pty");
    }
}

// ============================================================================
// Output Tests
// ============================================================================

mod output_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_output_buffer_small() {
        let mut buffer = OutputBuffer::new();
        buffer.push(b"hello ");
        buffer.push(b"world");
        assert_eq!(buffer.into_string(), "hello world");
    }

    #[test]
    fn test_output_buffer_lossy() {
        let mut buffer = OutputBuffer::new();
        buffer.push(b"ok \xff\xfe done");
        assert_eq!(buffer.into_string(), "ok \u{fffd}\u{fffd} done");
    }

    #[test]
    fn test_output_buffer_truncates() {
        let mut buffer = OutputBuffer::new();
        let chunk = vec![b'a'; 64 * 1024];
        for _ in 0..20 {
            buffer.push(&chunk);
        }
        let text = buffer.into_string();
        let total = 20 * 64 * 1024;
        assert!(text.starts_with("aaaa"));
        assert!(text.ends_with(&format!("[Output truncated, {total} bytes total]")));
        assert!(text.len() < MAX_OUTPUT_SIZE + 100);
    }

    #[test]
    fn test_output_buffer_truncates_on_char_boundary() {
        let mut buffer = OutputBuffer::new();
        buffer.push(&vec![b'a'; MAX_OUTPUT_SIZE - 1]);
        // Two-byte character straddling the limit.
        buffer.push("é".as_bytes());
        let text = buffer.into_string();
        assert!(text.contains("[Output truncated"));
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_code_mapping() {
        use std::os::unix::process::ExitStatusExt;

        // Raw wait statuses: exited with 3, killed by SIGKILL.
        assert_eq!(exit_code(std::process::ExitStatus::from_raw(3 << 8)), 3);
        assert_eq!(
            exit_code(std::process::ExitStatus::from_raw(libc::SIGKILL)),
            EXIT_CODE_SIGNAL_BASE + libc::SIGKILL
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_pty_exit_code_matches_pipe_mapping() {
        use cliguard_utils_pty::ExitStatus;
        use std::os::unix::process::ExitStatusExt;

        assert_eq!(pty_exit_code(&ExitStatus::with_exit_code(3)), 3);
        for signal in [libc::SIGTERM, libc::SIGKILL, libc::SIGHUP] {
            let raw = std::process::ExitStatus::from_raw(signal);
            assert_eq!(
                pty_exit_code(&ExitStatus::from(raw)),
                exit_code(raw),
                "signal {signal}"
            );
        }

        assert_eq!(
            pty_exit_code(&ExitStatus::with_signal("Signal 77")),
            EXIT_CODE_SIGNAL_BASE + 77
        );
        // Unrecognised descriptions keep the recorded code.
        assert_eq!(pty_exit_code(&ExitStatus::with_signal("no such signal")), 1);
    }

    #[test]
    fn test_result_success() {
        let result = ExecutionResult {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: 0,
            timed_out: false,
            duration: Duration::ZERO,
        };
        assert!(result.success());
        assert!(
            !ExecutionResult {
                exit_code: 2,
                ..result
            }
            .success()
        );
    }
}

// ============================================================================
// Error Tests
// ============================================================================

mod error_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_error_display() {
        let err = ExecError::from(Violation::CommandNotAllowed {
            command: "rm".to_string(),
        });
        assert_eq!(err.to_string(), "Security violation: Command 'rm' is not allowed");
        assert!(err.violation().is_some());

        let err = ExecError::Timeout {
            timeout: Duration::from_secs(30),
            pid: Some(42),
            partial: None,
        };
        assert_eq!(err.to_string(), "Command timed out after 30 seconds");
        assert!(err.is_timeout());

        let err = ExecError::execution("failed to spawn process", "No such file or directory");
        assert_eq!(
            err.to_string(),
            "failed to spawn process: No such file or directory"
        );
        assert!(err.violation().is_none());
    }
}
