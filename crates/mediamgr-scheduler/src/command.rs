use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, SchedulerError};

/// Captured result of one external command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` when the process was terminated by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    pub fn status_text(&self) -> String {
        match self.status {
            Some(code) => format!("exit code {code}"),
            None => "terminated by signal".to_string(),
        }
    }

    /// Convert a non-zero exit into [`SchedulerError::CommandFailed`].
    pub fn check(self, program: &str) -> Result<Self> {
        if self.success() {
            Ok(self)
        } else {
            Err(SchedulerError::CommandFailed {
                program: program.to_string(),
                status: self.status_text(),
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Runs external scheduler commands. Backends never spawn processes directly.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[&str], stdin: Option<&str>) -> Result<CommandOutput>;
}

/// Spawns real processes, each bounded by `timeout`.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    timeout: Duration,
}

impl SystemRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, program: &str, args: &[&str], stdin: Option<&str>) -> Result<CommandOutput> {
        debug!(program, ?args, "Running scheduler command");

        let mut child = Command::new(program)
            .args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    SchedulerError::Unavailable(format!("{program} not found on PATH"))
                }
                _ => SchedulerError::Spawn {
                    program: program.to_string(),
                    source: e,
                },
            })?;

        let input = stdin.map(str::to_owned);
        let pipe = child.stdin.take();
        let exchange = async move {
            if let (Some(mut pipe), Some(input)) = (pipe, input) {
                pipe.write_all(input.as_bytes()).await?;
                pipe.shutdown().await?;
            }
            child.wait_with_output().await
        };

        // Dropping `exchange` on timeout drops the child, which kills it.
        let output = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| SchedulerError::Timeout {
                program: program.to_string(),
                ms: self.timeout.as_millis() as u64,
            })?
            .map_err(|e| SchedulerError::Spawn {
                program: program.to_string(),
                source: e,
            })?;

        Ok(CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
