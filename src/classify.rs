//! Classification of host-CLI output.
//!
//! The host CLI reports "a PR for this branch already exists" as a non-zero
//! exit, which for this workflow is the desired end state, not a failure.
//! All text matching against the CLI's unstructured output lives here so the
//! rules can be swapped for a structured (`--json`) mode without touching
//! orchestration. The wording is host/version-dependent: treat these
//! patterns as a compatibility shim, and watch for the drift warning below.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::runner::CommandResult;

/// Reference to a pull request extracted from CLI output. Fields are
/// optional because a succeeded command with unparseable output must not
/// fail the workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRef {
    pub url: Option<String>,
    pub number: Option<u64>,
}

/// Outcome of a PR-creation attempt after classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrOutcome {
    /// A new PR was created.
    Created(PullRequestRef),
    /// A PR for this branch already exists; reusing it is success.
    AlreadyExists(PullRequestRef),
    /// Genuine failure, raw stderr as the reason.
    Failed(String),
}

static PR_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https://\S+/pull/(\d+)").unwrap());

// (?s): the URL usually sits on the line after "already exists".
static ALREADY_EXISTS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)already exists.*?(https://\S+/pull/(\d+))").unwrap());

static ISSUE_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https://\S+/issues/(\d+)").unwrap());

fn parse_pr_ref(text: &str) -> Option<PullRequestRef> {
    let captures = PR_URL_RE.captures(text)?;
    Some(PullRequestRef {
        url: Some(captures.get(0)?.as_str().to_string()),
        number: captures.get(1)?.as_str().parse().ok(),
    })
}

/// Classify the raw result of a PR-creation command.
pub fn classify_pr_creation(result: &CommandResult) -> PrOutcome {
    if result.succeeded() {
        return match parse_pr_ref(&result.stdout) {
            Some(pr) => PrOutcome::Created(pr),
            None => {
                tracing::warn!(
                    stdout = %result.stdout.trim(),
                    "PR created but its URL could not be parsed from the output"
                );
                PrOutcome::Created(PullRequestRef {
                    url: None,
                    number: None,
                })
            }
        };
    }

    let merged = result.merged();
    if let Some(captures) = ALREADY_EXISTS_RE.captures(&merged) {
        let url = captures.get(1).map(|m| m.as_str().to_string());
        let number = captures.get(2).and_then(|m| m.as_str().parse().ok());
        return PrOutcome::AlreadyExists(PullRequestRef { url, number });
    }

    // Surface wording drift early instead of silently degrading to Failed
    if merged.contains("already exists") {
        tracing::warn!(
            output = %merged.trim(),
            "Output nearly matched the existing-PR pattern but did not parse; \
             the host CLI wording may have changed"
        );
    }

    PrOutcome::Failed(result.stderr.trim().to_string())
}

/// Extract the issue number from `gh issue create` output (it prints the
/// new issue's URL).
pub fn parse_issue_number(output: &str) -> Option<u64> {
    ISSUE_URL_RE
        .captures(output)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
