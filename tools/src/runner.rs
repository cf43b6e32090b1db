//! Shell runner — executes command lines through the host shell
//!
//! Pipeline: spawn (own process group) → drain merged output → wait → classify.
//! Every invocation is bounded by a caller-supplied wall-clock timeout; when it
//! elapses the whole process group is killed.

use async_trait::async_trait;
use serde::Serialize;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Outcome class of one command invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Success,
    Timeout,
    ProcessError,
    Exception,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Success => "success",
            ExecutionStatus::Timeout => "timeout",
            ExecutionStatus::ProcessError => "process_error",
            ExecutionStatus::Exception => "exception",
        }
    }
}

/// Result of running a single command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub status: ExecutionStatus,
    /// Captured text, already formatted for display for non-success outcomes
    pub output: String,
    /// Only set for `ProcessError`
    pub exit_code: Option<i32>,
}

impl ExecutionResult {
    pub fn success(output: String) -> Self {
        Self {
            status: ExecutionStatus::Success,
            output,
            exit_code: None,
        }
    }

    pub fn timed_out(timeout: Duration) -> Self {
        Self {
            status: ExecutionStatus::Timeout,
            output: format!("Command timed out after {} seconds", format_seconds(timeout)),
            exit_code: None,
        }
    }

    pub fn process_error(code: i32, captured: &str) -> Self {
        Self {
            status: ExecutionStatus::ProcessError,
            output: format!("Error (code {code}): {captured}"),
            exit_code: Some(code),
        }
    }

    pub fn exception(message: impl std::fmt::Display) -> Self {
        Self {
            status: ExecutionStatus::Exception,
            output: format!("Exception: {message}"),
            exit_code: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Success
    }
}

/// Executes command lines on behalf of the dispatcher.
///
/// The shell implementation runs anything it is given. A restricted executor
/// can be dropped in behind this trait without touching the HTTP layer.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command_line: &str, timeout: Duration) -> ExecutionResult;
}

/// Runs command lines via `<shell> -c`, stderr folded into stdout
pub struct ShellRunner {
    shell: String,
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new("/bin/sh")
    }
}

impl ShellRunner {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    pub fn shell(&self) -> &str {
        &self.shell
    }

    fn build_command(&self, command_line: &str) -> Command {
        // Redirect inside the shell so both streams share one pipe and keep
        // their relative ordering.
        let script = format!("exec 2>&1\n{command_line}");

        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c")
            .arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        #[cfg(unix)]
        cmd.process_group(0);

        cmd
    }

    async fn spawn_and_wait(&self, command_line: &str, timeout: Duration) -> ExecutionResult {
        let mut child = match self.build_command(command_line).spawn() {
            Ok(child) => child,
            Err(e) => return ExecutionResult::exception(e),
        };
        let mut stdout = child.stdout.take();

        let collected = tokio::time::timeout(timeout, async {
            let mut captured = Vec::new();
            if let Some(pipe) = stdout.as_mut() {
                pipe.read_to_end(&mut captured).await?;
            }
            let status = child.wait().await?;
            Ok::<_, std::io::Error>((status, captured))
        })
        .await;

        match collected {
            Err(_) => {
                terminate(&mut child).await;
                ExecutionResult::timed_out(timeout)
            }
            Ok(Err(e)) => {
                terminate(&mut child).await;
                ExecutionResult::exception(e)
            }
            Ok(Ok((status, captured))) => {
                let text = String::from_utf8_lossy(&captured).into_owned();
                if status.success() {
                    ExecutionResult::success(text)
                } else {
                    ExecutionResult::process_error(exit_code(&status), &text)
                }
            }
        }
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, command_line: &str, timeout: Duration) -> ExecutionResult {
        let execution_id = Uuid::new_v4();
        let start = Instant::now();
        debug!("[{execution_id}] {} -c {command_line:?}", self.shell);

        let result = self.spawn_and_wait(command_line, timeout).await;

        let elapsed_ms = start.elapsed().as_millis();
        match result.status {
            ExecutionStatus::Success | ExecutionStatus::ProcessError => info!(
                "[{execution_id}] command={command_line:?} status={} exit_code={:?} duration_ms={elapsed_ms}",
                result.status.as_str(),
                result.exit_code
            ),
            ExecutionStatus::Timeout | ExecutionStatus::Exception => warn!(
                "[{execution_id}] command={command_line:?} status={} duration_ms={elapsed_ms}: {}",
                result.status.as_str(),
                result.output
            ),
        }

        result
    }
}

/// Kill the child's whole process group, then reap the child itself
async fn terminate(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            // SAFETY: killpg only sends a signal; the group was created at
            // spawn with the child as leader.
            unsafe {
                libc::killpg(pid as libc::pid_t, libc::SIGKILL);
            }
        }
    }
    if let Err(e) = child.kill().await {
        debug!("Child already gone: {e}");
    }
}

/// Exit code, or the negated signal number for a signal-terminated child
fn exit_code(status: &ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }
    -1
}

fn format_seconds(duration: Duration) -> String {
    if duration.subsec_nanos() == 0 {
        duration.as_secs().to_string()
    } else {
        format!("{}", duration.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_echo_success() {
        let runner = ShellRunner::default();
        let result = runner.run("echo hello", Duration::from_secs(5)).await;
        assert_eq!(result.status, ExecutionStatus::Success);
        assert!(result.output.contains("hello"));
        assert_eq!(result.exit_code, None);
    }

    #[tokio::test]
    async fn test_run_timeout() {
        let runner = ShellRunner::default();
        let start = Instant::now();
        let result = runner.run("sleep 5", Duration::from_secs(1)).await;
        assert_eq!(result.status, ExecutionStatus::Timeout);
        assert_eq!(result.output, "Command timed out after 1 seconds");
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_run_timeout_kills_background_children() {
        let runner = ShellRunner::default();
        let start = Instant::now();
        // The backgrounded sleep holds the output pipe open
        let result = runner
            .run("sleep 30 & echo started; wait", Duration::from_millis(500))
            .await;
        assert_eq!(result.status, ExecutionStatus::Timeout);
        assert_eq!(result.output, "Command timed out after 0.5 seconds");
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_run_nonzero_exit() {
        let runner = ShellRunner::default();
        let result = runner.run("exit 3", Duration::from_secs(5)).await;
        assert_eq!(result.status, ExecutionStatus::ProcessError);
        assert!(result.output.starts_with("Error (code 3)"));
        assert_eq!(result.exit_code, Some(3));
    }

    #[tokio::test]
    async fn test_process_error_keeps_captured_output() {
        let runner = ShellRunner::default();
        let result = runner
            .run("echo partial; exit 2", Duration::from_secs(5))
            .await;
        assert_eq!(result.output, "Error (code 2): partial\n");
    }

    #[tokio::test]
    async fn test_stderr_merged_into_output() {
        let runner = ShellRunner::default();
        let result = runner
            .run("echo out; echo err 1>&2", Duration::from_secs(5))
            .await;
        assert!(result.is_success());
        assert!(result.output.contains("out"));
        assert!(result.output.contains("err"));
    }

    #[tokio::test]
    async fn test_missing_binary_reports_shell_exit_code() {
        let runner = ShellRunner::default();
        let result = runner
            .run("a-command-that-cannot-exist-xyz123", Duration::from_secs(5))
            .await;
        assert_eq!(result.status, ExecutionStatus::ProcessError);
        assert_eq!(result.exit_code, Some(127));
    }

    #[tokio::test]
    async fn test_signal_terminated_child() {
        let runner = ShellRunner::default();
        let result = runner.run("kill -9 $$", Duration::from_secs(5)).await;
        assert_eq!(result.status, ExecutionStatus::ProcessError);
        assert_eq!(result.exit_code, Some(-9));
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_replaced() {
        let runner = ShellRunner::default();
        let result = runner
            .run(r"printf '\377abc'", Duration::from_secs(5))
            .await;
        assert!(result.is_success());
        assert!(result.output.contains("abc"));
        assert!(result.output.contains('\u{FFFD}'));
    }

    #[tokio::test]
    async fn test_unspawnable_shell_is_exception() {
        let runner = ShellRunner::new("/nonexistent/progour-shell");
        let result = runner.run("echo hi", Duration::from_secs(5)).await;
        assert_eq!(result.status, ExecutionStatus::Exception);
        assert!(result.output.starts_with("Exception: "));
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&ExecutionStatus::ProcessError).unwrap();
        assert_eq!(json, "\"process_error\"");
        assert_eq!(ExecutionStatus::Timeout.as_str(), "timeout");
    }

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(Duration::from_secs(30)), "30");
        assert_eq!(format_seconds(Duration::from_millis(1500)), "1.5");
    }
}
