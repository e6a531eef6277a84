//! Mutable engine configuration and the immutable state it resolves to.

use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;
use url::Url;

use super::{IsolatedLoader, LoadedClass, LoaderCache, ModuleFetcher, ModuleSource, SharedContract};
use crate::domain::artifact::hash_bytes;
use crate::domain::{
    AppError, ArtifactDigest, ArtifactSet, Coordinate, CoordinateTemplate, Preferences,
    SupportedVersions, Version, VersionPolicy, VersionSelection,
};
use crate::ports::Provisioner;

/// User-facing options for one engine.
///
/// Setters validate before assigning, so a rejected call leaves the
/// configuration exactly as it was. Nothing is resolved until [`get`](Self::get).
#[derive(Clone)]
pub struct EngineConfiguration {
    name: String,
    provisioner: Arc<dyn Provisioner>,
    supported: SupportedVersions,
    defaults: CoordinateTemplate,
    shared: SharedContract,
    loader_cache: Arc<LoaderCache>,
    fetcher: ModuleFetcher,
    version: Version,
    module_url: Option<Url>,
    dependency: Option<Coordinate>,
    preferences: Vec<PathBuf>,
}

impl fmt::Debug for EngineConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfiguration")
            .field("name", &self.name)
            .field("supported", &self.supported.to_string())
            .field("version", &self.version.to_string())
            .field("module_url", &self.module_url)
            .field("dependency", &self.dependency)
            .field("preferences", &self.preferences)
            .finish()
    }
}

impl EngineConfiguration {
    /// Configuration defaulting to the latest supported version.
    pub fn new(
        name: impl Into<String>,
        provisioner: impl Provisioner + 'static,
        supported: SupportedVersions,
        defaults: CoordinateTemplate,
    ) -> Result<Self, AppError> {
        Ok(Self {
            name: name.into(),
            provisioner: Arc::new(provisioner),
            version: supported.latest().clone(),
            supported,
            defaults,
            shared: SharedContract::standard(),
            loader_cache: LoaderCache::global(),
            fetcher: ModuleFetcher::with_defaults()?,
            module_url: None,
            dependency: None,
            preferences: Vec::new(),
        })
    }

    pub fn with_loader_cache(mut self, loader_cache: Arc<LoaderCache>) -> Self {
        self.loader_cache = loader_cache;
        self
    }

    pub fn with_fetcher(mut self, fetcher: ModuleFetcher) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_shared_contract(mut self, shared: SharedContract) -> Self {
        self.shared = shared;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn supported_versions(&self) -> &SupportedVersions {
        &self.supported
    }

    /// Select a supported version, or a module URL that replaces dependency resolution.
    ///
    /// A module URL leaves the reported version untouched.
    pub fn set_version(&mut self, requested: &str) -> Result<(), AppError> {
        match VersionPolicy::resolve(Some(requested), &self.supported)? {
            VersionSelection::Version(version) => {
                self.version = version;
                self.module_url = None;
            }
            VersionSelection::ModuleUrl(url) => {
                self.module_url = Some(url);
            }
        }
        Ok(())
    }

    /// Replace the version-derived dependencies with one explicit coordinate, or clear it.
    pub fn set_dependencies(&mut self, dependency: Option<&str>) -> Result<(), AppError> {
        self.dependency = dependency.map(Coordinate::parse).transpose()?;
        Ok(())
    }

    /// Preference files, merged in order. Existence is checked by [`get`](Self::get).
    pub fn set_preferences<P: Into<PathBuf>>(&mut self, files: impl IntoIterator<Item = P>) {
        self.preferences = files.into_iter().map(Into::into).collect();
    }

    fn selection(&self) -> VersionSelection {
        match &self.module_url {
            Some(url) => VersionSelection::ModuleUrl(url.clone()),
            None => VersionSelection::Version(self.version.clone()),
        }
    }

    /// Resolve the configuration into a snapshot.
    pub fn get(&self) -> Result<State, AppError> {
        let selection = self.selection();
        let artifacts = ModuleSource::resolve(
            &selection,
            self.dependency.as_ref(),
            &self.defaults,
            self.provisioner.as_ref(),
            &self.fetcher,
        )?;
        let loader = self.loader_cache.for_artifacts(&artifacts, &self.shared)?;
        let preferences = Preferences::load_all(&self.preferences)?;
        debug!(
            engine = %self.name,
            version = %self.version,
            artifacts = artifacts.len(),
            loader = %loader.id(),
            "resolved engine state"
        );
        Ok(State {
            version: self.version.clone(),
            module_url: self.module_url.clone(),
            artifacts,
            preferences,
            loader,
        })
    }
}

/// Immutable snapshot of a resolved configuration.
///
/// Equality and hashing cover the version, module URL, artifact content and
/// preference content. The loader handle is excluded, so states built in separate
/// processes from the same inputs compare equal.
#[derive(Clone)]
pub struct State {
    version: Version,
    module_url: Option<Url>,
    artifacts: ArtifactSet,
    preferences: Preferences,
    loader: Arc<IsolatedLoader>,
}

#[derive(Serialize)]
struct CanonicalState<'a> {
    version: &'a Version,
    module_url: Option<&'a str>,
    artifacts: BTreeSet<ArtifactDigest>,
    preferences: &'a Preferences,
}

impl State {
    pub fn load_class(&self, name: &str) -> Result<Arc<LoadedClass>, AppError> {
        self.loader.load_class(name)
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    /// -1, 0, or 1 as the configured version is lower, equal, or higher than `other`.
    pub fn compare_version_to(&self, other: Option<&str>) -> Result<i32, AppError> {
        VersionPolicy::compare(&self.version, other)
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn module_url(&self) -> Option<&Url> {
        self.module_url.as_ref()
    }

    pub fn artifacts(&self) -> &ArtifactSet {
        &self.artifacts
    }

    pub fn loader(&self) -> &Arc<IsolatedLoader> {
        &self.loader
    }

    /// Hex SHA-256 of the canonical form; stable across processes.
    pub fn fingerprint(&self) -> Result<String, AppError> {
        let canonical = CanonicalState {
            version: &self.version,
            module_url: self.module_url.as_ref().map(Url::as_str),
            artifacts: self.artifacts.identity(),
            preferences: &self.preferences,
        };
        let bytes = serde_json::to_vec(&canonical).map_err(|err| AppError::ParseError {
            what: "engine state".to_string(),
            details: err.to_string(),
        })?;
        Ok(hash_bytes(&bytes))
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("version", &self.version.to_string())
            .field("module_url", &self.module_url)
            .field("artifacts", &self.artifacts.identity())
            .field("preferences", &self.preferences)
            .finish()
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
            && self.module_url == other.module_url
            && self.artifacts == other.artifacts
            && self.preferences == other.preferences
    }
}

impl Eq for State {}

impl Hash for State {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.version.hash(state);
        self.module_url.hash(state);
        self.artifacts.hash(state);
        self.preferences.hash(state);
    }
}
