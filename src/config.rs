use serde::Deserialize;

use crate::error::{AppError, Result};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub git: GitConfig,
    #[serde(default)]
    pub host: HostConfig,
    #[serde(default)]
    pub policy: ProtectedBranchPolicy,
    #[serde(default)]
    pub runner: RunnerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GitConfig {
    #[serde(default = "default_git_program")]
    pub program: String,
    #[serde(default = "default_remote")]
    pub remote: String,
    #[serde(default = "default_branch_prefix")]
    pub branch_prefix: String,
    #[serde(default = "default_max_slug_length")]
    pub max_slug_length: usize,
    /// Base branch for new pull requests. When unset the host CLI picks
    /// the repository default.
    #[serde(default)]
    pub base_branch: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HostConfig {
    #[serde(default = "default_host_program")]
    pub program: String,
}

/// Branch names the workflow must never check out, reset, or push over.
/// Passed explicitly into the orchestrator so tests can supply their own.
#[derive(Debug, Deserialize, Clone)]
pub struct ProtectedBranchPolicy {
    #[serde(default = "default_protected_branches")]
    pub protected: Vec<String>,
}

impl ProtectedBranchPolicy {
    pub fn new(protected: Vec<String>) -> Self {
        Self { protected }
    }

    pub fn is_protected(&self, branch: &str) -> bool {
        self.protected.iter().any(|p| p == branch)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RunnerConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_git_program() -> String {
    "git".to_string()
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_branch_prefix() -> String {
    "patch/".to_string()
}

fn default_max_slug_length() -> usize {
    48
}

fn default_host_program() -> String {
    "gh".to_string()
}

fn default_protected_branches() -> Vec<String> {
    vec!["main".to_string(), "master".to_string()]
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            program: default_git_program(),
            remote: default_remote(),
            branch_prefix: default_branch_prefix(),
            max_slug_length: default_max_slug_length(),
            base_branch: None,
        }
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            program: default_host_program(),
        }
    }
}

impl Default for ProtectedBranchPolicy {
    fn default() -> Self {
        Self {
            protected: default_protected_branches(),
        }
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl AppConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Load from file if specified
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        } else {
            // Try default paths
            builder = builder.add_source(config::File::with_name("patchflow").required(false));
        }

        // Environment variable overrides with PATCHFLOW_ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("PATCHFLOW")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::Config(e.to_string()))
    }
}
