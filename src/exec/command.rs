// src/exec/command.rs

//! One-shot shell command execution.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::ScriptsConfig;

/// Boxed future returned by [`CommandExecutor::execute`].
pub type ExecFuture<'a> = Pin<Box<dyn Future<Output = bool> + Send + 'a>>;

/// Runs a single command to completion and reports pass/fail.
///
/// Production code uses [`ShellCommandExecutor`]; tests can provide an
/// implementation that records commands instead of spawning processes.
pub trait CommandExecutor: Send + Sync {
    /// `true` iff the command ran and exited with status 0.
    fn execute<'a>(&'a self, command: &'a str) -> ExecFuture<'a>;
}

/// Executes commands through `sh -c` with every standard stream attached to
/// the null device.
///
/// Output is never captured: a child can write any amount without blocking on
/// a full pipe, because there is no pipe.
#[derive(Debug, Clone)]
pub struct ShellCommandExecutor {
    shell: String,
    timeout: Option<Duration>,
}

impl ShellCommandExecutor {
    pub fn new(shell: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            shell: shell.into(),
            timeout,
        }
    }

    pub fn from_config(cfg: &ScriptsConfig) -> Self {
        Self::new(cfg.shell.clone(), cfg.timeout)
    }

    async fn run(&self, command: &str) -> bool {
        info!(cmd = %command, "running step command");

        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(cmd = %command, shell = %self.shell, error = %e, "failed to spawn command");
                return false;
            }
        };

        let waited = match self.timeout {
            None => child.wait().await,
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(res) => res,
                Err(_) => {
                    warn!(
                        cmd = %command,
                        timeout_ms = limit.as_millis() as u64,
                        "command timed out; killing process"
                    );
                    if let Err(e) = child.kill().await {
                        warn!(cmd = %command, error = %e, "failed to kill timed-out command");
                    }
                    return false;
                }
            },
        };

        match waited {
            Ok(status) => {
                let code = status.code().unwrap_or(-1);
                debug!(cmd = %command, exit_code = code, success = status.success(), "command exited");
                status.success()
            }
            Err(e) => {
                warn!(cmd = %command, error = %e, "waiting for command failed");
                false
            }
        }
    }
}

impl Default for ShellCommandExecutor {
    fn default() -> Self {
        Self::new("sh", None)
    }
}

impl CommandExecutor for ShellCommandExecutor {
    fn execute<'a>(&'a self, command: &'a str) -> ExecFuture<'a> {
        Box::pin(self.run(command))
    }
}
