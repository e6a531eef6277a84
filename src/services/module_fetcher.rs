//! Materializes a user-supplied module URL as a local artifact.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::Client;
use tempfile::NamedTempFile;
use tracing::debug;
use url::Url;

use super::CancellationToken;
use crate::domain::artifact::hash_content;
use crate::domain::{AppError, ArtifactLocation};

pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Fetches module files. `file` URLs are used in place; `http(s)` URLs are
/// downloaded into the cache directory.
#[derive(Debug, Clone)]
pub struct ModuleFetcher {
    cache_dir: PathBuf,
    client: Client,
    cancellation: CancellationToken,
}

impl ModuleFetcher {
    pub fn new(cache_dir: impl Into<PathBuf>, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { cache_dir: cache_dir.into(), client, cancellation: CancellationToken::new() })
    }

    /// Fetcher caching under the system temp directory.
    pub fn with_defaults() -> Result<Self, AppError> {
        Self::new(default_cache_dir(), Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS))
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn fetch(&self, url: &Url) -> Result<ArtifactLocation, AppError> {
        match url.scheme() {
            "file" => Self::fetch_file(url),
            "http" | "https" => self.fetch_remote(url),
            other => Err(AppError::invalid_argument(format!(
                "Module URL '{}' uses unsupported protocol '{}'",
                url, other
            ))),
        }
    }

    fn fetch_file(url: &Url) -> Result<ArtifactLocation, AppError> {
        let path = url
            .to_file_path()
            .map_err(|_| AppError::invalid_argument(format!("Module URL '{}' is not a local path", url)))?;
        if !path.is_file() {
            return Err(AppError::invalid_argument(format!(
                "Module file not found: {}",
                path.display()
            )));
        }
        Ok(ArtifactLocation::new(path))
    }

    fn fetch_remote(&self, url: &Url) -> Result<ArtifactLocation, AppError> {
        self.cancellation.check()?;
        let body = self.download(url)?;
        let target = self.cached_path(url);
        self.store(&body, &target)
            .map_err(|err| AppError::resolution_failure(url.to_string(), format!("cache write failed: {}", err)))?;
        debug!(%url, path = %target.display(), "downloaded module");
        Ok(ArtifactLocation::new(target))
    }

    /// Stage into a unique file next to `target`, then atomically replace it.
    fn store(&self, body: &str, target: &Path) -> std::io::Result<()> {
        fs::create_dir_all(&self.cache_dir)?;
        let mut staging = NamedTempFile::new_in(&self.cache_dir)?;
        staging.write_all(body.as_bytes())?;
        staging.persist(target).map_err(|err| err.error)?;
        Ok(())
    }

    fn download(&self, url: &Url) -> Result<String, AppError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| AppError::resolution_failure(url.to_string(), e.to_string()))?;

        let status = response.status();
        if status.is_client_error() {
            return Err(AppError::invalid_argument(format!(
                "Module URL '{}' was rejected with HTTP {}",
                url, status
            )));
        }
        if !status.is_success() {
            return Err(AppError::resolution_failure(url.to_string(), format!("HTTP {}", status)));
        }
        response.text().map_err(|e| AppError::resolution_failure(url.to_string(), e.to_string()))
    }

    fn cached_path(&self, url: &Url) -> PathBuf {
        let file_name = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|segment| !segment.is_empty())
            .unwrap_or("module.toml");
        let prefix: String = hash_content(url.as_str()).chars().take(16).collect();
        self.cache_dir.join(format!("{}-{}", prefix, file_name))
    }
}

pub fn default_cache_dir() -> PathBuf {
    std::env::temp_dir().join("fmtmod").join("modules")
}
