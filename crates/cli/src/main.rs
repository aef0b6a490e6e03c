//! Issue janitor CLI entry point.
//!
//! This binary is the composition root. It:
//!
//! 1. **Parses invocation parameters**: token, config path, API base URL,
//!    dry-run switch, and log format (see [`Cli`]).
//! 2. **Wires logging**: `tracing-subscriber` writing progress lines to stdout.
//! 3. **Loads configuration**: the JSON entry list, via [`janitor::parse_config`].
//! 4. **Constructs infrastructure**: a [`GithubClient`] injected into the
//!    [`Orchestrator`], which then runs every entry to completion.
//!
//! The exit status is 0 on success, 2 for configuration errors, and 1 for
//! every other fatal failure (see [`exit_codes`]).

mod exit_codes;
mod logging;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use github::GithubClient;
use janitor::{ConfigEntry, Orchestrator, RunId, RunMode, RunSummary};
use tracing::{error, info, info_span, Instrument};

use logging::LogFormat;

/// Applies labeling, commenting, closing, and locking rules to GitHub issues.
#[derive(Debug, Parser)]
#[command(name = "issue-janitor", version, about)]
struct Cli {
    /// GitHub token used for every API call.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: String,

    /// Configuration file (JSON list of owner entries).
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// GitHub API root; set for GitHub Enterprise.
    #[arg(long, env = "GITHUB_API_URL", default_value = github::DEFAULT_API_URL)]
    api_url: String,

    /// Log every decided action without changing anything on GitHub.
    #[arg(long)]
    dry_run: bool,

    /// Progress output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.log_format);

    let run_id = RunId::new_random();
    match run(cli).instrument(info_span!("run", %run_id)).await {
        Ok(summary) => {
            info!(
                %run_id,
                repositories = summary.repositories,
                issues_evaluated = summary.issues_evaluated,
                labels_added = summary.labels_added,
                comments_created = summary.comments_created,
                issues_closed = summary.issues_closed,
                issues_locked = summary.issues_locked,
                "Run complete"
            );
            ExitCode::from(exit_codes::OK)
        }
        Err(err) => {
            error!(%run_id, error = %format!("{err:#}"), "Run aborted");
            ExitCode::from(exit_codes::for_error(&err))
        }
    }
}

async fn run(cli: Cli) -> Result<RunSummary> {
    let entries = load_config(&cli.config)?;
    let client = GithubClient::new(&cli.token, &cli.api_url).context("Creating GitHub client")?;

    let mode = if cli.dry_run {
        RunMode::DryRun
    } else {
        RunMode::Apply
    };
    info!(
        config = %cli.config.display(),
        entries = entries.len(),
        dry_run = cli.dry_run,
        "Starting run"
    );

    let summary = Orchestrator::new(Arc::new(client))
        .with_mode(mode)
        .run(&entries)
        .await?;
    Ok(summary)
}

fn load_config(path: &Path) -> Result<Vec<ConfigEntry>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Reading config {}", path.display()))?;
    janitor::parse_config(&raw).with_context(|| format!("Parsing config {}", path.display()))
}
