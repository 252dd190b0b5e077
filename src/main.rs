use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use patchflow::config::AppConfig;
use patchflow::runner::ProcessRunner;
use patchflow::workflow::{ChangeRequest, Orchestrator};

#[derive(Parser)]
#[command(
    name = "patchflow",
    about = "Idempotent patch-branch and pull-request workflow over git and gh"
)]
struct Cli {
    /// Change description; becomes the commit message, branch slug, and PR title
    description: String,

    /// Limit staging to this file (repeatable); all tracked changes when omitted
    #[arg(short, long = "file", value_name = "PATH")]
    files: Vec<String>,

    /// Create an issue and link it for auto-close on merge
    #[arg(long)]
    issue: bool,

    /// Create a pull request, or reuse the one already open for the branch
    #[arg(long)]
    pr: bool,

    /// Existing issue number to close when the PR merges
    #[arg(long, value_name = "N")]
    closes: Option<u64>,

    /// Report what would happen without running any mutating command
    #[arg(long)]
    dry_run: bool,

    /// Branch off a protected branch anyway (discouraged)
    #[arg(long)]
    allow_protected_branch: bool,

    /// Print the outcome as JSON
    #[arg(long)]
    json: bool,

    /// Repository directory to operate in
    #[arg(short = 'C', long, value_name = "DIR", default_value = ".")]
    repo_dir: PathBuf,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())?;

    let runner = Arc::new(ProcessRunner::new(&config.runner));
    let orchestrator = Orchestrator::new(runner, config, cli.repo_dir);

    let request = ChangeRequest {
        description: cli.description,
        target_files: cli.files,
        create_issue: cli.issue,
        create_pr: cli.pr,
        issue_ref: cli.closes,
        dry_run: cli.dry_run,
        allow_protected_branch: cli.allow_protected_branch,
    };

    let outcome = orchestrator.run(&request).await;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("{}", outcome.message);
    }

    std::process::exit(outcome.exit_code());
}
