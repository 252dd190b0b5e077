//! Local change preparation: branch derivation, staging, committing.

use std::path::Path;

use crate::config::{GitConfig, ProtectedBranchPolicy};
use crate::error::{AppError, Result};
use crate::runner::{CommandRunner, CommandResult};

/// Validate a branch name to prevent argument injection.
/// Rejects names starting with `-` as defence in depth.
fn validate_branch_name(name: &str) -> Result<()> {
    if name.starts_with('-') {
        return Err(AppError::External {
            step: "Branch validation".to_string(),
            reason: format!("Invalid branch name (starts with '-'): {name}"),
        });
    }
    Ok(())
}

/// Normalize a change description into a branch slug: lower-cased, runs of
/// non-alphanumeric characters collapsed to a single `-`, truncated.
/// Deterministic, so re-running the same request lands on the same branch.
pub fn branch_slug(description: &str, max_len: usize) -> String {
    let mut slug = String::new();
    let mut pending_dash = false;
    for c in description.chars() {
        if slug.len() >= max_len {
            break;
        }
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug.truncate(max_len);
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        // All-punctuation descriptions still need a usable branch name
        slug.push_str("change");
    }
    slug
}

/// Result of preparing the local change set.
#[derive(Debug)]
pub struct PreparedChangeSet {
    pub branch_name: String,
    pub committed: bool,
    pub original_branch: String,
    pub switched: bool,
}

/// Stages and commits local changes on a derived feature branch, never
/// touching a protected branch without an explicit override.
pub struct ChangeSetBuilder<'a> {
    runner: &'a dyn CommandRunner,
    git: &'a GitConfig,
    policy: &'a ProtectedBranchPolicy,
    repo_dir: &'a Path,
}

impl<'a> ChangeSetBuilder<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        git: &'a GitConfig,
        policy: &'a ProtectedBranchPolicy,
        repo_dir: &'a Path,
    ) -> Self {
        Self {
            runner,
            git,
            policy,
            repo_dir,
        }
    }

    pub fn branch_name_for(&self, description: &str) -> String {
        format!(
            "{}{}",
            self.git.branch_prefix,
            branch_slug(description, self.git.max_slug_length)
        )
    }

    async fn run_git(&self, args: &[&str]) -> Result<CommandResult> {
        self.runner.run(&self.git.program, args, self.repo_dir).await
    }

    /// Read the current branch name (read-only).
    pub async fn current_branch(&self) -> Result<String> {
        let result = self.run_git(&["rev-parse", "--abbrev-ref", "HEAD"]).await?;
        if !result.succeeded() {
            return Err(AppError::External {
                step: "Reading current branch".to_string(),
                reason: result.stderr.trim().to_string(),
            });
        }
        Ok(result.stdout.trim().to_string())
    }

    /// Refuse to act while the checkout sits on a protected branch, unless
    /// the caller explicitly overrode the policy. Runs before any mutating
    /// git call.
    pub async fn validate_policy(&self, allow_protected: bool) -> Result<String> {
        let current = self.current_branch().await?;
        if self.policy.is_protected(&current) && !allow_protected {
            return Err(AppError::PolicyViolation(format!(
                "current branch '{current}' is protected; refusing to commit on it \
                 (pass --allow-protected-branch to branch off it anyway)"
            )));
        }
        Ok(current)
    }

    async fn branch_exists(&self, branch: &str) -> Result<bool> {
        let refname = format!("refs/heads/{branch}");
        let result = self
            .run_git(&["rev-parse", "--verify", "--quiet", &refname])
            .await?;
        Ok(result.succeeded())
    }

    async fn switch_branch(&self, branch: &str) -> Result<()> {
        let result = self.run_git(&["switch", branch]).await?;
        if !result.succeeded() {
            return Err(AppError::External {
                step: format!("Switching to branch '{branch}'"),
                reason: result.stderr.trim().to_string(),
            });
        }
        Ok(())
    }

    /// Create or switch to the feature branch, stage the requested files
    /// (or all tracked changes) and commit with the description as message.
    ///
    /// "Nothing to commit" is a logged no-op, not a failure: a PR can still
    /// be created or reused for a branch that was already pushed.
    ///
    /// Once the switch has happened, any later failure (staging, commit, a
    /// runner error) switches back to the original branch before the error
    /// is returned, so no exit path strands the checkout on a half-built
    /// feature branch.
    pub async fn prepare(
        &self,
        description: &str,
        target_files: &[String],
        allow_protected: bool,
    ) -> Result<PreparedChangeSet> {
        let original_branch = self.validate_policy(allow_protected).await?;

        let branch_name = self.branch_name_for(description);
        validate_branch_name(&branch_name)?;

        let switched = if original_branch == branch_name {
            false
        } else {
            // Branch off the current HEAD; the protected branch itself is
            // never pulled or checked out here.
            let result = if self.branch_exists(&branch_name).await? {
                self.run_git(&["switch", &branch_name]).await?
            } else {
                self.run_git(&["switch", "-c", &branch_name]).await?
            };
            if !result.succeeded() {
                return Err(AppError::External {
                    step: format!("Switching to branch '{branch_name}'"),
                    reason: result.stderr.trim().to_string(),
                });
            }
            tracing::info!(branch = %branch_name, "Switched to feature branch");
            true
        };

        let committed = match self.stage_and_commit(description, target_files).await {
            Ok(committed) => committed,
            Err(e) => {
                if switched {
                    if let Err(restore_err) = self.switch_branch(&original_branch).await {
                        tracing::warn!(
                            error = %restore_err,
                            branch = %original_branch,
                            "Could not switch back to the original branch"
                        );
                    } else {
                        tracing::info!(branch = %original_branch, "Restored original branch");
                    }
                }
                return Err(e);
            }
        };

        Ok(PreparedChangeSet {
            branch_name,
            committed,
            original_branch,
            switched,
        })
    }

    async fn stage_and_commit(&self, description: &str, target_files: &[String]) -> Result<bool> {
        let stage_result = if target_files.is_empty() {
            self.run_git(&["add", "-u"]).await?
        } else {
            let mut args = vec!["add", "--"];
            args.extend(target_files.iter().map(String::as_str));
            self.run_git(&args).await?
        };
        if !stage_result.succeeded() {
            return Err(AppError::External {
                step: "Staging changes".to_string(),
                reason: stage_result.stderr.trim().to_string(),
            });
        }

        let commit_result = self.run_git(&["commit", "-m", description]).await?;
        if commit_result.succeeded() {
            tracing::info!("Committed changes");
            Ok(true)
        } else if commit_result.merged().contains("nothing to commit") {
            tracing::info!("Nothing to commit, continuing with existing branch state");
            Ok(false)
        } else {
            Err(AppError::External {
                step: "Commit".to_string(),
                reason: commit_result.stderr.trim().to_string(),
            })
        }
    }

    /// Push the feature branch to the configured remote.
    pub async fn push(&self, branch_name: &str) -> Result<()> {
        validate_branch_name(branch_name)?;
        let result = self
            .run_git(&["push", "-u", &self.git.remote, branch_name])
            .await?;
        if !result.succeeded() {
            return Err(AppError::External {
                step: format!("Pushing '{branch_name}' to {}", self.git.remote),
                reason: result.stderr.trim().to_string(),
            });
        }
        tracing::info!(branch = %branch_name, remote = %self.git.remote, "Pushed branch");
        Ok(())
    }

    /// Switch back to the branch the workflow started on. Paired with the
    /// switch in `prepare` on every exit path.
    pub async fn restore(&self, prepared: &PreparedChangeSet) -> Result<()> {
        if !prepared.switched {
            return Ok(());
        }
        self.switch_branch(&prepared.original_branch).await?;
        tracing::info!(branch = %prepared.original_branch, "Restored original branch");
        Ok(())
    }
}
