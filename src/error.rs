use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Protected branch policy violation: {0}")]
    PolicyViolation(String),

    #[error("Failed to launch {program}: {reason}")]
    Launch { program: String, reason: String },

    #[error("{program} did not exit within {timeout_secs}s")]
    Timeout { program: String, timeout_secs: u64 },

    #[error("{step} failed: {reason}")]
    External { step: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Coarse failure category carried on a workflow outcome and mapped to the
/// process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    PolicyViolation,
    Launch,
    Timeout,
    External,
}

impl FailureKind {
    pub fn exit_code(self) -> i32 {
        match self {
            FailureKind::PolicyViolation => 2,
            FailureKind::Launch => 3,
            FailureKind::Timeout => 4,
            FailureKind::External => 1,
        }
    }
}

impl From<&AppError> for FailureKind {
    fn from(e: &AppError) -> Self {
        match e {
            AppError::PolicyViolation(_) => FailureKind::PolicyViolation,
            AppError::Launch { .. } => FailureKind::Launch,
            AppError::Timeout { .. } => FailureKind::Timeout,
            _ => FailureKind::External,
        }
    }
}
