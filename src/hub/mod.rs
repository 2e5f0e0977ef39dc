//! Retrying snapshot downloads from a model/dataset hub
//!
//! A download materializes every file of a remote repository into a local
//! directory. Attempts are strictly sequential: on failure the caller's
//! thread sleeps a fixed delay and tries again until the retry budget is
//! spent, then the last error is surfaced wrapped in
//! [`Error::RetriesExhausted`].
//!
//! ```text
//! attempting --ok--> done
//!     |  ^
//!     |  | err, budget left (sleep retry_delay)
//!     +--+
//!     |
//!     +--err, budget spent--> failed
//! ```

mod client;

pub use client::{env_flag, HubClient, HubConfig, DEFAULT_ENDPOINT, HF_TRANSFER_ENV};

use crate::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

/// Default number of attempts per repository
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Default delay between attempts, in seconds
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 5;

/// Kind of hub repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepoType {
    /// Model repository
    Model,
    /// Dataset repository
    #[default]
    Dataset,
    /// Space (hosted app) repository
    Space,
}

impl RepoType {
    /// Plural segment used by the hub's JSON API (`/api/datasets/...`)
    #[must_use]
    pub const fn api_segment(self) -> &'static str {
        match self {
            Self::Model => "models",
            Self::Dataset => "datasets",
            Self::Space => "spaces",
        }
    }

    /// Prefix in front of the repository id in file URLs.
    /// Models live at the root namespace.
    #[must_use]
    pub const fn url_prefix(self) -> &'static str {
        match self {
            Self::Model => "",
            Self::Dataset => "datasets/",
            Self::Space => "spaces/",
        }
    }
}

impl fmt::Display for RepoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Model => "model",
            Self::Dataset => "dataset",
            Self::Space => "space",
        })
    }
}

impl FromStr for RepoType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "model" => Ok(Self::Model),
            "dataset" => Ok(Self::Dataset),
            "space" => Ok(Self::Space),
            other => Err(Error::validation(format!(
                "repo_type must be one of model, dataset, space (got {other:?})"
            ))),
        }
    }
}

/// A remote repository and where its files should land locally
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    repo_id: String,
    repo_type: RepoType,
    local_dir: PathBuf,
}

impl RepoRef {
    /// Create a repository reference
    ///
    /// # Errors
    /// Returns [`Error::Validation`] if `repo_id` is blank
    pub fn new(
        repo_id: impl Into<String>,
        repo_type: RepoType,
        local_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        let repo_id = repo_id.into();
        if repo_id.trim().is_empty() {
            return Err(Error::validation("repo_id must be a non-empty string"));
        }
        Ok(Self {
            repo_id,
            repo_type,
            local_dir: local_dir.into(),
        })
    }

    /// Repository identifier, e.g. `huggingface/datasets-examples`
    #[must_use]
    pub fn repo_id(&self) -> &str {
        &self.repo_id
    }

    /// Repository kind
    #[must_use]
    pub const fn repo_type(&self) -> RepoType {
        self.repo_type
    }

    /// Destination directory
    #[must_use]
    pub fn local_dir(&self) -> &Path {
        &self.local_dir
    }
}

/// Fixed-delay retry budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    retry_delay: Duration,
}

impl RetryPolicy {
    /// Create a policy with `max_retries` total attempts and `retry_delay_secs`
    /// seconds between them
    ///
    /// # Errors
    /// Returns [`Error::Validation`] if `max_retries` is zero
    pub fn new(max_retries: u32, retry_delay_secs: u64) -> Result<Self> {
        Self::with_delay(max_retries, Duration::from_secs(retry_delay_secs))
    }

    /// Same as [`RetryPolicy::new`] with a sub-second delay
    ///
    /// # Errors
    /// Returns [`Error::Validation`] if `max_retries` is zero
    pub fn with_delay(max_retries: u32, retry_delay: Duration) -> Result<Self> {
        if max_retries == 0 {
            return Err(Error::validation("max_retries must be a positive integer"));
        }
        Ok(Self {
            max_retries,
            retry_delay,
        })
    }

    /// Total number of attempts
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Pause between attempts
    #[must_use]
    pub const fn retry_delay(&self) -> Duration {
        self.retry_delay
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: Duration::from_secs(DEFAULT_RETRY_DELAY_SECS),
        }
    }
}

/// Something that can materialize a repository snapshot on disk
pub trait SnapshotSource {
    /// Download every file of `repo` into its local directory, overwriting
    /// existing copies, and return the directory path
    ///
    /// # Errors
    /// Returns error if the repository cannot be resolved or a file fails to transfer
    fn snapshot(&self, repo: &RepoRef) -> Result<PathBuf>;
}

/// Run `op` under `policy`, calling `sleep` between failed attempts.
///
/// `op` receives the 1-based attempt number. When every attempt fails,
/// `sleep` has been called exactly `max_retries - 1` times and the last
/// error comes back inside [`Error::RetriesExhausted`].
///
/// # Errors
/// Returns [`Error::RetriesExhausted`] once the budget is spent
pub fn retry_with<T, F, S>(policy: &RetryPolicy, label: &str, mut op: F, mut sleep: S) -> Result<T>
where
    F: FnMut(u32) -> Result<T>,
    S: FnMut(Duration),
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op(attempt) {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!("Error occurred while downloading {label}: {e}");
                if attempt >= policy.max_retries {
                    warn!("Exceeded maximum retries for {label}");
                    return Err(Error::RetriesExhausted {
                        repo_id: label.to_string(),
                        attempts: attempt,
                        source: Box::new(e),
                    });
                }
                info!(
                    "Retrying download ({attempt}/{}) after {:?}...",
                    policy.max_retries, policy.retry_delay
                );
                sleep(policy.retry_delay);
            }
        }
    }
}

/// Download `repo` through `source`, retrying per `policy`.
///
/// Blocks the calling thread for both the transfer and the delays.
///
/// # Errors
/// Returns [`Error::RetriesExhausted`] wrapping the last attempt's error
pub fn download_with_retry<S: SnapshotSource + ?Sized>(
    source: &S,
    repo: &RepoRef,
    policy: &RetryPolicy,
) -> Result<PathBuf> {
    retry_with(
        policy,
        repo.repo_id(),
        |attempt| {
            info!(
                "Starting download from repo: {} (type: {}, attempt {attempt})",
                repo.repo_id(),
                repo.repo_type()
            );
            let path = source.snapshot(repo)?;
            info!("Download complete. Files are located at: {}", path.display());
            Ok(path)
        },
        std::thread::sleep,
    )
}
