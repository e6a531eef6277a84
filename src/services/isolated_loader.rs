//! Isolated module loaders and the cache that owns them.
//!
//! A loader defines its own copy of every class found in its artifacts. Classes
//! from two loaders never share identity, even when the manifests are identical
//! byte for byte, so two versions of an engine can run side by side in one
//! process. Names listed in the [`SharedContract`] are the exception: they are
//! delegated to the host and resolve to the same [`LoadedClass`] everywhere.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use tracing::{debug, info};

use super::EngineLinker;
use crate::domain::{AppError, ArtifactDigest, ArtifactSet, ModuleManifest, Preferences};
use crate::ports::{EngineConstructor, FormatterEngine};

/// Name of the contract every engine implements.
pub const FORMATTER_ENGINE_CONTRACT: &str = "fmtmod.FormatterEngine";

/// Identifies the loader that defined a class. Host classes have none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoaderId(u64);

impl fmt::Display for LoaderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "loader-{}", self.0)
    }
}

/// Class names that cross the isolation boundary with their identity intact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SharedContract {
    classes: BTreeSet<String>,
}

impl SharedContract {
    pub fn new<S: Into<String>>(classes: impl IntoIterator<Item = S>) -> Self {
        Self { classes: classes.into_iter().map(Into::into).collect() }
    }

    /// The contract every engine step shares: just the engine interface.
    pub fn standard() -> Self {
        Self::new([FORMATTER_ENGINE_CONTRACT])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(String::as_str)
    }
}

impl Default for SharedContract {
    fn default() -> Self {
        Self::standard()
    }
}

/// Cache key: content identity of the artifacts plus the shared class names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoaderKey {
    artifacts: BTreeSet<ArtifactDigest>,
    shared: BTreeSet<String>,
}

impl LoaderKey {
    pub fn new(artifacts: &ArtifactSet, shared: &SharedContract) -> Self {
        Self { artifacts: artifacts.identity(), shared: shared.classes.clone() }
    }
}

/// A class defined by exactly one loader (or by the host).
pub struct LoadedClass {
    name: String,
    entry: Option<String>,
    methods: Vec<String>,
    defined_by: Option<LoaderId>,
    origin: String,
    constructor: Option<EngineConstructor>,
}

impl fmt::Debug for LoadedClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedClass")
            .field("name", &self.name)
            .field("entry", &self.entry)
            .field("defined_by", &self.defined_by)
            .field("origin", &self.origin)
            .finish()
    }
}

impl LoadedClass {
    fn host(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entry: None,
            methods: Vec::new(),
            defined_by: None,
            origin: "host".to_string(),
            constructor: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The loader that defined this class; `None` for shared host classes.
    pub fn defined_by(&self) -> Option<LoaderId> {
        self.defined_by
    }

    /// File name of the artifact the class came from.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn has_method(&self, method: &str) -> bool {
        self.methods.iter().any(|declared| declared == method)
    }

    /// Fail unless the class declares `method`.
    pub fn require_method(&self, method: &str) -> Result<(), AppError> {
        if self.has_method(method) {
            Ok(())
        } else {
            Err(AppError::invalid_argument(format!(
                "Class '{}' from {} has no method '{}'",
                self.name, self.origin, method
            )))
        }
    }

    /// Construct an engine instance through the linked entry point.
    pub fn new_instance(&self, preferences: &Preferences) -> Result<Box<dyn FormatterEngine>, AppError> {
        let constructor = self.constructor.ok_or_else(|| match &self.entry {
            Some(entry) => AppError::invalid_argument(format!(
                "Class '{}' binds to entry '{}', which the host does not provide",
                self.name, entry
            )),
            None => AppError::invalid_argument(format!("Class '{}' cannot be instantiated", self.name)),
        })?;
        constructor(preferences).map_err(|err| {
            AppError::invalid_argument(format!("Class '{}' rejected its preferences: {}", self.name, err))
        })
    }
}

/// A class namespace scoped to one artifact set.
pub struct IsolatedLoader {
    id: LoaderId,
    key: LoaderKey,
    origins: Vec<String>,
    classes: BTreeMap<String, Arc<LoadedClass>>,
    shared: BTreeMap<String, Arc<LoadedClass>>,
}

impl fmt::Debug for IsolatedLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IsolatedLoader")
            .field("id", &self.id)
            .field("origins", &self.origins)
            .field("classes", &self.classes.keys())
            .finish()
    }
}

impl IsolatedLoader {
    fn define(
        id: LoaderId,
        key: LoaderKey,
        artifacts: &ArtifactSet,
        shared: BTreeMap<String, Arc<LoadedClass>>,
        linker: &EngineLinker,
    ) -> Result<Self, AppError> {
        let mut classes = BTreeMap::new();
        let mut origins = Vec::with_capacity(artifacts.len());
        for artifact in artifacts.iter() {
            let manifest = ModuleManifest::parse(&artifact.content, &artifact.location.to_string())?;
            origins.push(artifact.digest.file_name.clone());
            for declaration in manifest.classes {
                // Parent-first for shared names; first artifact wins on duplicates.
                if shared.contains_key(&declaration.name) || classes.contains_key(&declaration.name) {
                    continue;
                }
                let class = LoadedClass {
                    constructor: linker.lookup(&declaration.entry),
                    name: declaration.name.clone(),
                    entry: Some(declaration.entry),
                    methods: declaration.methods,
                    defined_by: Some(id),
                    origin: artifact.digest.file_name.clone(),
                };
                classes.insert(declaration.name, Arc::new(class));
            }
        }
        Ok(Self { id, key, origins, classes, shared })
    }

    pub fn id(&self) -> LoaderId {
        self.id
    }

    pub fn key(&self) -> &LoaderKey {
        &self.key
    }

    /// Look a class up by fully-qualified name.
    pub fn load_class(&self, name: &str) -> Result<Arc<LoadedClass>, AppError> {
        self.shared.get(name).or_else(|| self.classes.get(name)).cloned().ok_or_else(|| {
            AppError::invalid_argument(format!(
                "Class '{}' not found in module(s): {}",
                name,
                self.origins.join(", ")
            ))
        })
    }

    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }
}

type Slot = Arc<Mutex<Option<Arc<IsolatedLoader>>>>;

/// Append-only cache of loaders keyed by content identity.
///
/// Lookups of distinct keys only contend on the map lock; construction happens
/// under the per-key slot lock so each key is built at most once.
pub struct LoaderCache {
    linker: EngineLinker,
    slots: Mutex<HashMap<LoaderKey, Slot>>,
    host_classes: Mutex<HashMap<String, Arc<LoadedClass>>>,
    next_id: AtomicU64,
    constructed: AtomicUsize,
}

impl fmt::Debug for LoaderCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderCache")
            .field("linker", &self.linker)
            .field("constructed", &self.constructed.load(Ordering::SeqCst))
            .finish()
    }
}

impl LoaderCache {
    pub fn new(linker: EngineLinker) -> Self {
        Self {
            linker,
            slots: Mutex::new(HashMap::new()),
            host_classes: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            constructed: AtomicUsize::new(0),
        }
    }

    /// Process-wide cache linked against the builtin engines.
    pub fn global() -> Arc<LoaderCache> {
        static GLOBAL: OnceLock<Arc<LoaderCache>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(LoaderCache::new(EngineLinker::with_builtins()))).clone()
    }

    pub fn linker(&self) -> &EngineLinker {
        &self.linker
    }

    /// Loader for exactly these artifacts; identical content yields the identical loader.
    pub fn for_artifacts(
        &self,
        artifacts: &ArtifactSet,
        shared: &SharedContract,
    ) -> Result<Arc<IsolatedLoader>, AppError> {
        let key = LoaderKey::new(artifacts, shared);
        let slot = {
            let mut slots = self.slots.lock();
            slots.entry(key.clone()).or_default().clone()
        };

        let mut guard = slot.lock();
        if let Some(loader) = guard.as_ref() {
            debug!(loader = %loader.id, "loader cache hit");
            return Ok(loader.clone());
        }

        let id = LoaderId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let shared_classes = shared.iter().map(|name| (name.to_string(), self.host_class(name))).collect();
        let loader = Arc::new(IsolatedLoader::define(id, key, artifacts, shared_classes, &self.linker)?);
        self.constructed.fetch_add(1, Ordering::SeqCst);
        info!(loader = %id, modules = ?loader.origins, "constructed isolated loader");
        *guard = Some(loader.clone());
        Ok(loader)
    }

    /// Number of loaders constructed so far.
    pub fn len(&self) -> usize {
        self.constructed.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn host_class(&self, name: &str) -> Arc<LoadedClass> {
        self.host_classes
            .lock()
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(LoadedClass::host(name)))
            .clone()
    }
}
