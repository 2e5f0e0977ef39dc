//! Download model/dataset repository snapshots from the hub.
//!
//! Repositories are fetched one after another. A repository that still
//! fails after every retry is logged and skipped; the remaining ones are
//! still attempted.
//!
//! ```bash
//! hub-download distilbert-base-uncased huggingface/datasets-examples \
//!     --repo-type dataset --local-dir ./data --max-retries 5 --retry-delay 5
//! ```

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use datakit::hub::{
    self, env_flag, HubClient, HubConfig, RepoRef, RepoType, RetryPolicy, HF_TRANSFER_ENV,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliRepoType {
    Model,
    Dataset,
    Space,
}

impl From<CliRepoType> for RepoType {
    fn from(kind: CliRepoType) -> Self {
        match kind {
            CliRepoType::Model => Self::Model,
            CliRepoType::Dataset => Self::Dataset,
            CliRepoType::Space => Self::Space,
        }
    }
}

#[derive(Parser)]
#[command(name = "hub-download")]
#[command(version, about = "Download hub repository snapshots with retries", long_about = None)]
struct Cli {
    #[arg(required = true, help = "Repository IDs to download, in order")]
    repo_ids: Vec<String>,

    #[arg(long, value_enum, default_value = "dataset", help = "Repository kind")]
    repo_type: CliRepoType,

    #[arg(long, default_value = ".", help = "Directory the files are written to")]
    local_dir: PathBuf,

    #[arg(
        long,
        default_value_t = hub::DEFAULT_MAX_RETRIES,
        value_parser = clap::value_parser!(u32).range(1..),
        help = "Attempts per repository"
    )]
    max_retries: u32,

    #[arg(
        long,
        default_value_t = hub::DEFAULT_RETRY_DELAY_SECS,
        help = "Seconds to wait between attempts"
    )]
    retry_delay: u64,

    #[arg(long, default_value = "main", help = "Branch, tag or commit to download")]
    revision: String,

    #[arg(long, short, help = "Show verbose debug output")]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    datakit::logging::init(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    // Accelerated transfer is on unless the environment turns it off
    let config = HubConfig::from_env()
        .with_revision(&cli.revision)
        .with_accelerated_transfer(env_flag(HF_TRANSFER_ENV).unwrap_or(true));
    let client = HubClient::new(config).context("failed to build hub client")?;
    let policy = RetryPolicy::new(cli.max_retries, cli.retry_delay)?;

    info!(
        "Downloading {} repositories into {}",
        cli.repo_ids.len(),
        cli.local_dir.display()
    );
    for repo_id in &cli.repo_ids {
        let outcome = RepoRef::new(repo_id.as_str(), cli.repo_type.into(), cli.local_dir.clone())
            .and_then(|repo| hub::download_with_retry(&client, &repo, &policy));
        if let Err(e) = outcome {
            error!("Skipping {repo_id} due to an error: {e}");
        }
    }
    Ok(())
}
