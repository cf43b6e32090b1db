//! Installation probe — is an executable resolvable on the search path?

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Answers "is this executable installed?".
///
/// Implementations must never fail: anything that prevents a positive answer
/// degrades to `false`.
#[async_trait]
pub trait InstallProbe: Send + Sync {
    async fn is_installed(&self, executable: &str) -> bool;
}

/// Probe backed by `which <name>`, or any resolver with the same contract
/// (exit status 0 means found)
pub struct WhichProbe {
    program: String,
    timeout: Duration,
}

impl Default for WhichProbe {
    fn default() -> Self {
        Self::new(crate::DEFAULT_PROBE_TIMEOUT)
    }
}

impl WhichProbe {
    pub fn new(timeout: Duration) -> Self {
        Self::with_program("which", timeout)
    }

    pub fn with_program(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl InstallProbe for WhichProbe {
    async fn is_installed(&self, executable: &str) -> bool {
        if executable.trim().is_empty() {
            return false;
        }

        let mut cmd = Command::new(&self.program);
        cmd.arg(executable)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        match tokio::time::timeout(self.timeout, cmd.status()).await {
            Ok(Ok(status)) => status.success(),
            Ok(Err(e)) => {
                debug!("{} {executable} could not run: {e}", self.program);
                false
            }
            Err(_) => {
                warn!(
                    "{} {executable} timed out after {:?}, treating as not installed",
                    self.program, self.timeout
                );
                false
            }
        }
    }
}
