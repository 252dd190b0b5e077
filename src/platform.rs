//! Host-platform boundary: issue and pull-request operations via the host
//! CLI (`gh` by default). The core only consumes exit codes and output text.

use std::path::Path;

use crate::classify::{self, PrOutcome};
use crate::config::{GitConfig, HostConfig};
use crate::error::{AppError, Result};
use crate::runner::{CommandRunner, CommandResult};

pub struct HostCli<'a> {
    runner: &'a dyn CommandRunner,
    host: &'a HostConfig,
    git: &'a GitConfig,
    repo_dir: &'a Path,
}

impl<'a> HostCli<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        host: &'a HostConfig,
        git: &'a GitConfig,
        repo_dir: &'a Path,
    ) -> Self {
        Self {
            runner,
            host,
            git,
            repo_dir,
        }
    }

    async fn run_host(&self, args: &[&str]) -> Result<CommandResult> {
        self.runner
            .run(&self.host.program, args, self.repo_dir)
            .await
    }

    /// Create an issue and return its number, parsed from the URL the host
    /// CLI prints.
    pub async fn create_issue(&self, title: &str, body: &str) -> Result<u64> {
        let result = self
            .run_host(&["issue", "create", "--title", title, "--body", body])
            .await?;
        if !result.succeeded() {
            return Err(AppError::External {
                step: "Issue creation".to_string(),
                reason: result.stderr.trim().to_string(),
            });
        }
        let number = classify::parse_issue_number(&result.merged()).ok_or_else(|| {
            AppError::External {
                step: "Issue creation".to_string(),
                reason: format!(
                    "issue created but its number could not be parsed from: {}",
                    result.stdout.trim()
                ),
            }
        })?;
        tracing::info!(issue = number, "Created issue");
        Ok(number)
    }

    /// Create a pull request for `branch`, or reuse the one that already
    /// exists for it.
    ///
    /// When `issue_ref` is given, the closing keyword is embedded in the
    /// body before submission so the host auto-closes the issue on merge.
    /// A reused PR is indistinguishable from a fresh one for callers.
    pub async fn create_or_reuse_pr(
        &self,
        branch: &str,
        title: &str,
        body: &str,
        issue_ref: Option<u64>,
    ) -> Result<PrOutcome> {
        let body = match issue_ref {
            Some(n) => format!("{body}\n\nCloses #{n}"),
            None => body.to_string(),
        };

        let mut args = vec![
            "pr",
            "create",
            "--title",
            title,
            "--body",
            body.as_str(),
            "--head",
            branch,
        ];
        if let Some(base) = self.git.base_branch.as_deref() {
            args.push("--base");
            args.push(base);
        }

        let result = self.run_host(&args).await?;
        let outcome = classify::classify_pr_creation(&result);

        match &outcome {
            PrOutcome::Created(pr) => {
                tracing::info!(url = pr.url.as_deref().unwrap_or("?"), "Created pull request");
            }
            PrOutcome::AlreadyExists(pr) => {
                tracing::info!(
                    url = pr.url.as_deref().unwrap_or("?"),
                    "Pull request for this branch already exists, reusing it"
                );
            }
            PrOutcome::Failed(reason) => {
                tracing::error!(%reason, "Pull request creation failed");
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::PullRequestRef;
    use crate::runner::stub::{failed, ok, StubRunner};

    fn host() -> HostConfig {
        HostConfig::default()
    }

    #[tokio::test]
    async fn test_create_issue_parses_number() {
        let stub = StubRunner::new();
        stub.respond(
            "gh issue create",
            ok("https://github.com/acme/widgets/issues/17\n"),
        );

        let host_cfg = host();
        let git = GitConfig::default();
        let cli = HostCli::new(&stub, &host_cfg, &git, Path::new("."));
        assert_eq!(cli.create_issue("title", "body").await.unwrap(), 17);
    }

    #[tokio::test]
    async fn test_pr_body_embeds_closing_keyword() {
        let stub = StubRunner::new();
        stub.respond("gh pr create", ok("https://github.com/acme/widgets/pull/5\n"));

        let host_cfg = host();
        let git = GitConfig::default();
        let cli = HostCli::new(&stub, &host_cfg, &git, Path::new("."));
        cli.create_or_reuse_pr("patch/x", "title", "body", Some(17))
            .await
            .unwrap();

        let calls = stub.calls();
        assert!(
            calls.iter().any(|c| c.contains("Closes #17")),
            "PR creation command should carry the closing keyword: {calls:?}"
        );
    }

    #[tokio::test]
    async fn test_existing_pr_is_reused() {
        let stub = StubRunner::new();
        stub.respond(
            "gh pr create",
            failed(
                1,
                "a pull request for branch \"patch/x\" already exists:\n\
                 https://github.com/acme/widgets/pull/42",
            ),
        );

        let host_cfg = host();
        let git = GitConfig::default();
        let cli = HostCli::new(&stub, &host_cfg, &git, Path::new("."));
        let outcome = cli
            .create_or_reuse_pr("patch/x", "title", "body", None)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            PrOutcome::AlreadyExists(PullRequestRef {
                url: Some("https://github.com/acme/widgets/pull/42".to_string()),
                number: Some(42),
            })
        );
    }

    #[tokio::test]
    async fn test_base_branch_is_passed_through() {
        let stub = StubRunner::new();
        let host_cfg = host();
        let git = GitConfig {
            base_branch: Some("develop".to_string()),
            ..GitConfig::default()
        };
        let cli = HostCli::new(&stub, &host_cfg, &git, Path::new("."));
        cli.create_or_reuse_pr("patch/x", "t", "b", None).await.unwrap();

        assert!(stub.calls()[0].contains("--base develop"));
    }
}
