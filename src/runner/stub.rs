//! Scripted command runner for tests.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::Result;
use crate::runner::{CommandRunner, CommandResult};

/// Records every command line and replays queued responses.
///
/// Responses are keyed by a command-line prefix ("git push", "gh pr create");
/// the first queued response whose prefix matches is consumed. Unmatched
/// commands succeed with empty output, so tests only script the calls they
/// care about.
#[derive(Default)]
pub struct StubRunner {
    responses: Mutex<Vec<(String, VecDeque<CommandResult>)>>,
    calls: Mutex<Vec<String>>,
}

pub fn ok(stdout: &str) -> CommandResult {
    CommandResult {
        exit_code: 0,
        stdout: stdout.to_string(),
        stderr: String::new(),
        duration_ms: 1,
    }
}

pub fn failed(exit_code: i32, stderr: &str) -> CommandResult {
    CommandResult {
        exit_code,
        stdout: String::new(),
        stderr: stderr.to_string(),
        duration_ms: 1,
    }
}

impl StubRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for the next command line starting with `prefix`.
    pub fn respond(&self, prefix: &str, result: CommandResult) {
        let mut responses = self.responses.lock().unwrap();
        if let Some((_, queue)) = responses.iter_mut().find(|(p, _)| p == prefix) {
            queue.push_back(result);
        } else {
            responses.push((prefix.to_string(), VecDeque::from([result])));
        }
    }

    /// Every recorded command line, in invocation order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count_matching(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }
}

#[async_trait]
impl CommandRunner for StubRunner {
    async fn run(&self, program: &str, args: &[&str], _cwd: &Path) -> Result<CommandResult> {
        let command_line = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        self.calls.lock().unwrap().push(command_line.clone());

        let mut responses = self.responses.lock().unwrap();
        for (prefix, queue) in responses.iter_mut() {
            if command_line.starts_with(prefix.as_str()) {
                if let Some(result) = queue.pop_front() {
                    return Ok(result);
                }
            }
        }
        Ok(ok(""))
    }
}
