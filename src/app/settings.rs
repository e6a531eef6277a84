//! Formatter settings loaded from a TOML file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::AppError;
use crate::services::{
    CancellationToken, DEFAULT_FETCH_TIMEOUT_SECS, EngineConfiguration, FormatterStep,
    JavaFormatterStep, LocalRepositoryResolver, ModuleFetcher, ResolverProvisioner,
    default_cache_dir,
};

/// Settings for one formatter step, usually `fmtmod.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormatterSettings {
    /// Engine selection and preferences.
    #[serde(default)]
    pub step: StepSettings,
    /// Local module repository.
    #[serde(default)]
    pub repository: RepositorySettings,
    /// Module URL fetching.
    #[serde(default)]
    pub fetch: FetchSettings,
    /// Directory relative paths are resolved against.
    #[serde(skip)]
    base_dir: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepSettings {
    /// Supported version or module URL; latest supported when absent.
    #[serde(default)]
    pub version: Option<String>,
    /// Explicit `group:artifact:version` replacing the default dependencies.
    #[serde(default)]
    pub dependencies: Option<String>,
    /// Preference files, merged in order.
    #[serde(default)]
    pub preferences: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepositorySettings {
    #[serde(default = "default_repository_path")]
    pub path: PathBuf,
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self { path: default_repository_path() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FetchSettings {
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self { cache_dir: None, timeout_secs: default_timeout() }
    }
}

fn default_repository_path() -> PathBuf {
    PathBuf::from("repository")
}

fn default_timeout() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECS
}

impl FormatterSettings {
    /// Read and validate settings; relative paths resolve against the file's directory.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        if !path.is_file() {
            return Err(AppError::config_error(format!(
                "Settings file not found: {}",
                path.display()
            )));
        }
        let content = fs::read_to_string(path)?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::parse(&content, base_dir)
    }

    pub fn parse(content: &str, base_dir: impl Into<PathBuf>) -> Result<Self, AppError> {
        let mut settings: FormatterSettings = toml::from_str(content)?;
        settings.base_dir = base_dir.into();
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.fetch.timeout_secs == 0 {
            return Err(AppError::config_error("fetch.timeout_secs must be greater than 0"));
        }
        Ok(())
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() { path.to_path_buf() } else { self.base_dir.join(path) }
    }

    pub fn repository_root(&self) -> PathBuf {
        self.resolve_path(&self.repository.path)
    }

    pub fn preference_files(&self) -> Vec<PathBuf> {
        self.step.preferences.iter().map(|path| self.resolve_path(path)).collect()
    }

    pub fn provisioner(
        &self,
        cancellation: CancellationToken,
    ) -> ResolverProvisioner<LocalRepositoryResolver> {
        ResolverProvisioner::new(LocalRepositoryResolver::new(self.repository_root()))
            .with_cancellation(cancellation)
    }

    pub fn fetcher(&self, cancellation: CancellationToken) -> Result<ModuleFetcher, AppError> {
        let cache_dir = match &self.fetch.cache_dir {
            Some(dir) => self.resolve_path(dir),
            None => default_cache_dir(),
        };
        Ok(ModuleFetcher::new(cache_dir, Duration::from_secs(self.fetch.timeout_secs))?
            .with_cancellation(cancellation))
    }

    /// Apply the step options to a configuration.
    pub fn apply(
        &self,
        mut config: EngineConfiguration,
        cancellation: CancellationToken,
    ) -> Result<EngineConfiguration, AppError> {
        if let Some(version) = &self.step.version {
            config.set_version(version)?;
        }
        config.set_dependencies(self.step.dependencies.as_deref())?;
        config.set_preferences(self.preference_files());
        Ok(config.with_fetcher(self.fetcher(cancellation)?))
    }

    /// Lazy Java formatter step wired to the configured repository.
    pub fn java_step(&self, cancellation: CancellationToken) -> Result<FormatterStep, AppError> {
        let config = JavaFormatterStep::create_config(self.provisioner(cancellation.clone()))?;
        Ok(JavaFormatterStep::create_step(self.apply(config, cancellation)?))
    }
}
