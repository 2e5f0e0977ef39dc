//! Blocking HTTP client for the hub's repository API
//!
//! Two endpoints are used:
//! - `GET {endpoint}/api/{models|datasets|spaces}/{repo_id}/revision/{rev}` lists files
//! - `GET {endpoint}/{prefix}{repo_id}/resolve/{rev}/{path}` streams one file
//!
//! Files are fetched one at a time and always re-downloaded.

use super::{RepoRef, SnapshotSource};
use crate::{Error, Result};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Public hub endpoint
pub const DEFAULT_ENDPOINT: &str = "https://huggingface.co";

/// Process-wide flag enabling accelerated transfers
pub const HF_TRANSFER_ENV: &str = "HF_HUB_ENABLE_HF_TRANSFER";

const ENDPOINT_ENV: &str = "HF_ENDPOINT";
const TOKEN_ENV: &str = "HF_TOKEN";
const DEFAULT_REVISION: &str = "main";

/// Write buffer for plain transfers
const STANDARD_BUFFER_BYTES: usize = 64 * 1024;
/// Write buffer when accelerated transfer is on
const ACCELERATED_BUFFER_BYTES: usize = 8 * 1024 * 1024;

/// Hub connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubConfig {
    endpoint: String,
    token: Option<String>,
    revision: String,
    accelerated_transfer: bool,
    connect_timeout: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            token: None,
            revision: DEFAULT_REVISION.to_string(),
            accelerated_transfer: false,
            connect_timeout: Duration::from_secs(30),
        }
    }
}

impl HubConfig {
    /// Resolve settings from `HF_ENDPOINT`, `HF_TOKEN` and
    /// `HF_HUB_ENABLE_HF_TRANSFER`, falling back to defaults
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(endpoint) = non_empty_env(ENDPOINT_ENV) {
            config.endpoint = endpoint;
        }
        config.token = non_empty_env(TOKEN_ENV);
        config.accelerated_transfer = env_flag(HF_TRANSFER_ENV).unwrap_or(false);
        config
    }

    /// Override the hub endpoint
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the bearer token for private or gated repositories
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Pin a branch, tag or commit
    #[must_use]
    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = revision.into();
        self
    }

    /// Toggle accelerated transfer
    #[must_use]
    pub const fn with_accelerated_transfer(mut self, enabled: bool) -> Self {
        self.accelerated_transfer = enabled;
        self
    }

    /// Hub endpoint
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Revision downloaded
    #[must_use]
    pub fn revision(&self) -> &str {
        &self.revision
    }

    /// Whether accelerated transfer is on
    #[must_use]
    pub const fn accelerated_transfer(&self) -> bool {
        self.accelerated_transfer
    }

    const fn buffer_bytes(&self) -> usize {
        if self.accelerated_transfer {
            ACCELERATED_BUFFER_BYTES
        } else {
            STANDARD_BUFFER_BYTES
        }
    }
}

/// Parse a boolean environment flag. `None` when unset or unrecognized.
#[must_use]
pub fn env_flag(name: &str) -> Option<bool> {
    let value = std::env::var(name).ok()?;
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Deserialize)]
struct RepoInfo {
    #[serde(default)]
    siblings: Vec<Sibling>,
}

#[derive(Debug, Deserialize)]
struct Sibling {
    rfilename: String,
}

/// Blocking hub client
pub struct HubClient {
    config: HubConfig,
    http: Client,
}

impl HubClient {
    /// Build a client
    ///
    /// # Errors
    /// Returns error if the endpoint is not a valid base URL or the TLS
    /// backend fails to initialize
    pub fn new(config: HubConfig) -> Result<Self> {
        base_url(&config.endpoint)?;
        let http = Client::builder()
            .user_agent(concat!("datakit/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(config.connect_timeout)
            .timeout(None::<Duration>)
            .build()?;
        Ok(Self { config, http })
    }

    /// Client settings
    #[must_use]
    pub const fn config(&self) -> &HubConfig {
        &self.config
    }

    /// List the repository's file paths at the configured revision
    ///
    /// # Errors
    /// Returns [`Error::NotFound`] when the hub reports the repository or
    /// revision missing (or inaccessible), HTTP errors otherwise
    pub fn list_files(&self, repo: &RepoRef) -> Result<Vec<String>> {
        let url = self.info_url(repo)?;
        debug!("GET {url}");
        let response = self.authorized(self.http.get(url)).send()?;
        let info: RepoInfo = self.check(response, repo)?.json()?;
        Ok(info.siblings.into_iter().map(|s| s.rfilename).collect())
    }

    /// Stream one file into the repository's local directory, replacing any
    /// existing copy. Returns the number of bytes written.
    ///
    /// # Errors
    /// Returns error on unsafe file paths, HTTP failures or IO failures
    pub fn download_file(&self, repo: &RepoRef, file: &str) -> Result<u64> {
        let target = local_path(repo.local_dir(), file)?;
        let url = self.file_url(repo, file)?;
        debug!("GET {url} -> {}", target.display());

        let mut response = self.check(self.authorized(self.http.get(url)).send()?, repo)?;

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        write_atomically(&mut response, &target, self.config.buffer_bytes())
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn check(&self, response: Response, repo: &RepoRef) -> Result<Response> {
        match response.status() {
            StatusCode::NOT_FOUND | StatusCode::UNAUTHORIZED => Err(Error::not_found(format!(
                "{} repository {} at revision {}",
                repo.repo_type(),
                repo.repo_id(),
                self.config.revision
            ))),
            _ => Ok(response.error_for_status()?),
        }
    }

    fn info_url(&self, repo: &RepoRef) -> Result<Url> {
        let mut segments = vec!["api", repo.repo_type().api_segment()];
        segments.extend(repo.repo_id().split('/'));
        segments.extend(["revision", self.config.revision.as_str()]);
        join_url(&self.config.endpoint, segments)
    }

    fn file_url(&self, repo: &RepoRef, file: &str) -> Result<Url> {
        let mut segments = Vec::new();
        let prefix = repo.repo_type().url_prefix().trim_end_matches('/');
        if !prefix.is_empty() {
            segments.push(prefix);
        }
        segments.extend(repo.repo_id().split('/'));
        segments.extend(["resolve", self.config.revision.as_str()]);
        segments.extend(file.split('/'));
        join_url(&self.config.endpoint, segments)
    }
}

impl SnapshotSource for HubClient {
    fn snapshot(&self, repo: &RepoRef) -> Result<PathBuf> {
        let files = self.list_files(repo)?;
        fs::create_dir_all(repo.local_dir())?;

        let mut total_bytes = 0;
        for file in &files {
            let bytes = self.download_file(repo, file)?;
            debug!("Fetched {file} ({bytes} bytes)");
            total_bytes += bytes;
        }
        info!(
            "Fetched {} files ({total_bytes} bytes) from {}",
            files.len(),
            repo.repo_id()
        );
        Ok(repo.local_dir().to_path_buf())
    }
}

fn base_url(endpoint: &str) -> Result<Url> {
    let url = Url::parse(endpoint)
        .map_err(|e| Error::validation(format!("invalid hub endpoint {endpoint:?}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(Error::validation(format!(
            "hub endpoint cannot be a base URL: {endpoint}"
        )));
    }
    Ok(url)
}

/// Append path segments to `endpoint`, percent-encoding each one
fn join_url<'a>(endpoint: &str, segments: impl IntoIterator<Item = &'a str>) -> Result<Url> {
    let mut url = base_url(endpoint)?;
    url.path_segments_mut()
        .map_err(|()| Error::validation(format!("hub endpoint cannot be a base URL: {endpoint}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Map a remote file path under `dir`, refusing anything that could escape it
fn local_path(dir: &Path, file: &str) -> Result<PathBuf> {
    let relative = Path::new(file);
    let safe = !file.is_empty()
        && relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if !safe {
        return Err(Error::validation(format!("unsafe remote file path: {file:?}")));
    }
    Ok(dir.join(relative))
}

fn partial_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push(".incomplete");
    PathBuf::from(name)
}

/// Stream `reader` into a sibling `.incomplete` file and rename it over
/// `target` once flushed. On any failure the partial file is removed and
/// `target` is left untouched.
fn write_atomically<R: Read>(reader: &mut R, target: &Path, buffer_bytes: usize) -> Result<u64> {
    let partial = partial_path(target);
    let result = stream_to(reader, &partial, buffer_bytes).and_then(|bytes| {
        fs::rename(&partial, target)?;
        Ok(bytes)
    });

    if result.is_err() {
        if let Err(e) = fs::remove_file(&partial) {
            debug!("Could not remove {}: {e}", partial.display());
        }
    }
    result
}

fn stream_to<R: Read>(reader: &mut R, path: &Path, buffer_bytes: usize) -> Result<u64> {
    let mut writer = BufWriter::with_capacity(buffer_bytes, File::create(path)?);
    let bytes = io::copy(reader, &mut writer)?;
    writer.flush()?;
    Ok(bytes)
}
