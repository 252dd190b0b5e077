pub mod process;
#[cfg(test)]
pub mod stub;

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;

pub use process::ProcessRunner;

/// Captured result of one external command invocation.
///
/// A non-zero exit code is data for the caller to interpret, never an error
/// by itself.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

impl CommandResult {
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }

    /// Combined stdout + stderr view used for pattern matching. The host
    /// CLI is not consistent about which stream carries its messages.
    pub fn merged(&self) -> String {
        let mut merged = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !merged.is_empty() {
                merged.push('\n');
            }
            merged.push_str(&self.stderr);
        }
        merged
    }
}

/// Seam through which every external process (git, host CLI) is invoked.
/// Tests substitute a scripted stub here.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` in `cwd` and wait for it to exit.
    ///
    /// Returns `Err` only when the program cannot be spawned or exceeds the
    /// runner's timeout; every exit code is a plain `CommandResult`.
    async fn run(&self, program: &str, args: &[&str], cwd: &Path) -> Result<CommandResult>;
}
