use serde::Serialize;

use crate::error::FailureKind;

/// One patch request. Immutable once constructed, never persisted.
#[derive(Debug, Clone)]
pub struct ChangeRequest {
    pub description: String,
    /// Files to stage; empty means all tracked changes.
    pub target_files: Vec<String>,
    pub create_issue: bool,
    pub create_pr: bool,
    /// Existing issue to close on merge. A freshly created issue
    /// (`create_issue`) takes precedence.
    pub issue_ref: Option<u64>,
    pub dry_run: bool,
    pub allow_protected_branch: bool,
}

impl ChangeRequest {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            target_files: Vec::new(),
            create_issue: false,
            create_pr: false,
            issue_ref: None,
            dry_run: false,
            allow_protected_branch: false,
        }
    }
}

/// Aggregated result of one workflow run; the sole value surfaced to the
/// caller/CLI. A dry run produces the same shape as a live run, telling
/// them apart only via `dry_run`.
#[derive(Debug, Serialize)]
pub struct WorkflowOutcome {
    pub success: bool,
    pub dry_run: bool,
    pub branch_name: String,
    pub pull_request_url: Option<String>,
    pub pull_request_number: Option<u64>,
    pub issue_number: Option<u64>,
    /// One human-readable sentence.
    pub message: String,
    /// Ordered raw diagnostic trail.
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
}

impl WorkflowOutcome {
    pub fn new(branch_name: String, dry_run: bool) -> Self {
        Self {
            success: false,
            dry_run,
            branch_name,
            pull_request_url: None,
            pull_request_number: None,
            issue_number: None,
            message: String::new(),
            errors: Vec::new(),
            failure: None,
        }
    }

    pub fn exit_code(&self) -> i32 {
        if self.success {
            0
        } else {
            self.failure.map(FailureKind::exit_code).unwrap_or(1)
        }
    }
}
