use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;

use crate::config::RunnerConfig;
use crate::error::{AppError, Result};
use crate::runner::{CommandRunner, CommandResult};

/// Spawns real child processes and waits for them sequentially.
pub struct ProcessRunner {
    timeout: Duration,
}

impl ProcessRunner {
    pub fn new(config: &RunnerConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, program: &str, args: &[&str], cwd: &Path) -> Result<CommandResult> {
        tracing::debug!(program, ?args, "Running external command");

        let started = Instant::now();

        let child = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // The child is killed if the timeout drops the future
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AppError::Launch {
                program: program.to_string(),
                reason: e.to_string(),
            })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| AppError::Timeout {
                program: program.to_string(),
                timeout_secs: self.timeout.as_secs(),
            })?
            .map_err(|e| AppError::Launch {
                program: program.to_string(),
                reason: e.to_string(),
            })?;

        let result = CommandResult {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            duration_ms: started.elapsed().as_millis() as u64,
        };

        tracing::debug!(
            program,
            exit_code = result.exit_code,
            duration_ms = result.duration_ms,
            "External command finished"
        );

        Ok(result)
    }
}
