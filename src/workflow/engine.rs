//! Linear patch workflow:
//! validate policy -> commit -> push -> (create issue) -> (create-or-reuse
//! PR) -> report. Each step blocks on its external command; failure exits
//! early, and the original branch is restored on every exit path.

use std::path::PathBuf;
use std::sync::Arc;

use crate::changeset::ChangeSetBuilder;
use crate::classify::PrOutcome;
use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::platform::HostCli;
use crate::runner::CommandRunner;
use crate::workflow::types::{ChangeRequest, WorkflowOutcome};

pub struct Orchestrator {
    runner: Arc<dyn CommandRunner>,
    config: AppConfig,
    repo_dir: PathBuf,
}

impl Orchestrator {
    pub fn new(runner: Arc<dyn CommandRunner>, config: AppConfig, repo_dir: PathBuf) -> Self {
        Self {
            runner,
            config,
            repo_dir,
        }
    }

    /// Run the full workflow for one request. Never returns `Err`: every
    /// failure is folded into the outcome so the caller gets one structured
    /// report either way.
    pub async fn run(&self, request: &ChangeRequest) -> WorkflowOutcome {
        let changes = ChangeSetBuilder::new(
            self.runner.as_ref(),
            &self.config.git,
            &self.config.policy,
            &self.repo_dir,
        );
        let host = HostCli::new(
            self.runner.as_ref(),
            &self.config.host,
            &self.config.git,
            &self.repo_dir,
        );

        let branch_name = changes.branch_name_for(&request.description);
        let mut outcome = WorkflowOutcome::new(branch_name.clone(), request.dry_run);

        tracing::info!(branch = %branch_name, dry_run = request.dry_run, "Starting patch workflow");

        if request.dry_run {
            // Policy validation is read-only and still runs; every mutating
            // step is skipped without touching the command runner.
            if let Err(e) = changes.validate_policy(request.allow_protected_branch).await {
                return fail(outcome, e);
            }
            // Same shape as a live run: a supplied issue reference is
            // reported even though nothing is submitted
            outcome.issue_number = request.issue_ref;
            outcome.success = true;
            outcome.message = dry_run_message(&branch_name, request);
            tracing::info!("{}", outcome.message);
            return outcome;
        }

        let prepared = match changes
            .prepare(
                &request.description,
                &request.target_files,
                request.allow_protected_branch,
            )
            .await
        {
            Ok(p) => p,
            Err(e) => return fail(outcome, e),
        };

        let steps = self
            .remote_steps(&changes, &host, request, &prepared.branch_name, &mut outcome)
            .await;

        // Restore runs on success and failure alike
        if let Err(e) = changes.restore(&prepared).await {
            tracing::warn!(error = %e, "Could not restore the original branch");
            outcome.errors.push(e.to_string());
        }

        match steps {
            Ok(()) => {
                outcome.success = true;
                outcome.message = success_message(&outcome);
                tracing::info!("{}", outcome.message);
                outcome
            }
            Err(e) => fail(outcome, e),
        }
    }

    /// Push, optional issue creation, optional PR creation. Split out so the
    /// caller can restore the original branch regardless of where this exits.
    async fn remote_steps(
        &self,
        changes: &ChangeSetBuilder<'_>,
        host: &HostCli<'_>,
        request: &ChangeRequest,
        branch_name: &str,
        outcome: &mut WorkflowOutcome,
    ) -> Result<()> {
        changes.push(branch_name).await?;

        let mut issue_number = request.issue_ref;
        if request.create_issue {
            match host
                .create_issue(&request.description, &request.description)
                .await
            {
                Ok(number) => issue_number = Some(number),
                Err(e) => {
                    // A pushed branch with a PR but no linked issue beats
                    // aborting with neither
                    tracing::warn!(error = %e, "Issue creation failed, continuing without a linked issue");
                    outcome.errors.push(e.to_string());
                }
            }
        }
        outcome.issue_number = issue_number;

        if request.create_pr {
            let pr_outcome = host
                .create_or_reuse_pr(
                    branch_name,
                    &request.description,
                    &request.description,
                    issue_number,
                )
                .await?;
            match pr_outcome {
                PrOutcome::Created(pr) | PrOutcome::AlreadyExists(pr) => {
                    outcome.pull_request_url = pr.url;
                    outcome.pull_request_number = pr.number;
                }
                PrOutcome::Failed(reason) => {
                    return Err(AppError::External {
                        step: "Pull request creation".to_string(),
                        reason,
                    });
                }
            }
        }

        Ok(())
    }
}

fn fail(mut outcome: WorkflowOutcome, error: AppError) -> WorkflowOutcome {
    tracing::error!(error = %error, "Patch workflow failed");
    outcome.success = false;
    outcome.failure = Some((&error).into());
    outcome.message = error.to_string();
    outcome.errors.push(error.to_string());
    outcome
}

fn success_message(outcome: &WorkflowOutcome) -> String {
    match &outcome.pull_request_url {
        Some(url) => format!(
            "Branch '{}' is pushed and pull request {} is ready.",
            outcome.branch_name, url
        ),
        None => format!("Branch '{}' is committed and pushed.", outcome.branch_name),
    }
}

fn dry_run_message(branch_name: &str, request: &ChangeRequest) -> String {
    let mut actions = vec![format!("commit on '{branch_name}'"), "push".to_string()];
    if request.create_issue {
        actions.push("create an issue".to_string());
    }
    if request.create_pr {
        actions.push("create or reuse a pull request".to_string());
    }
    format!("Dry run: would {}.", actions.join(", "))
}
