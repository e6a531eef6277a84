//! Shared fixtures for fmtmod integration tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fmtmod::domain::{Coordinate, CoordinateTemplate, SupportedVersions};
use fmtmod::services::{
    EngineConfiguration, EngineLinker, LoaderCache, LocalRepositoryResolver, ModuleFetcher,
    ResolverProvisioner,
};
use tempfile::TempDir;

pub const NAME: &str = "test configuration";
pub const VERSION_LOW: &str = "0.0.1";
pub const VERSION_IN_BETWEEN: &str = "0.1.0";
pub const VERSION_HIGH: &str = "1.0.0";
pub const VERSION_TOO_HIGH: &str = "10.0.0";
pub const VERSIONS: &[&str] = &[VERSION_LOW, VERSION_HIGH, VERSION_IN_BETWEEN];
pub const DEFAULT_COORDINATES: &str = "dev.test:formatter-ext:{version}";
pub const DEPENDENCY_OLD: &str = "dev.test:formatter-lib:1.0.0";
pub const DEPENDENCY_NEW: &str = "dev.test:formatter-lib:1.12.0";

/// Present in every formatter-lib release.
pub const IMPORT_ORDER_CLASS: &str = "dev.test.java.ImportOrderStep";
/// Only present from formatter-lib 1.12.0 on.
pub const WHITESPACE_CLASS: &str = "dev.test.kotlin.WhitespaceStep";

/// Testing harness with a populated module repository in a temp directory.
#[allow(dead_code)]
pub struct TestContext {
    root: TempDir,
}

#[allow(dead_code)]
impl TestContext {
    pub fn new() -> Self {
        let root = TempDir::new().expect("Failed to create temp directory for tests");
        let ctx = Self { root };
        ctx.publish(DEPENDENCY_OLD, &[], &[(IMPORT_ORDER_CLASS, "import-order")]);
        ctx.publish(
            DEPENDENCY_NEW,
            &[],
            &[(IMPORT_ORDER_CLASS, "import-order"), (WHITESPACE_CLASS, "trailing-whitespace")],
        );
        ctx.publish("dev.test:formatter-ext:0.0.1", &[DEPENDENCY_OLD], &[]);
        ctx.publish("dev.test:formatter-ext:0.1.0", &[DEPENDENCY_OLD], &[]);
        ctx.publish("dev.test:formatter-ext:1.0.0", &[DEPENDENCY_NEW], &[]);
        ctx
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn repository(&self) -> PathBuf {
        self.root.path().join("repository")
    }

    /// Write a module into the repository.
    pub fn publish(&self, coordinate: &str, requires: &[&str], classes: &[(&str, &str)]) -> PathBuf {
        let coordinate = Coordinate::parse(coordinate).expect("valid coordinate");
        let path = LocalRepositoryResolver::new(self.repository()).artifact_path(&coordinate);
        fs::create_dir_all(path.parent().unwrap()).expect("Failed to create module directory");
        fs::write(&path, module_manifest(&coordinate, requires, classes))
            .expect("Failed to write module");
        path
    }

    /// Write a file relative to the context root.
    pub fn create_file(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.root.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&path, content).expect("Failed to write test file");
        path
    }

    pub fn fetcher(&self) -> ModuleFetcher {
        ModuleFetcher::new(self.root.path().join("cache"), std::time::Duration::from_secs(2))
            .expect("Failed to create fetcher")
    }

    /// Configuration over the test repository with its own loader cache.
    pub fn configuration(&self) -> EngineConfiguration {
        self.configuration_with_cache(Arc::new(LoaderCache::new(EngineLinker::with_builtins())))
    }

    pub fn configuration_with_cache(&self, cache: Arc<LoaderCache>) -> EngineConfiguration {
        EngineConfiguration::new(
            NAME,
            ResolverProvisioner::new(LocalRepositoryResolver::new(self.repository())),
            SupportedVersions::new(VERSIONS).expect("valid versions"),
            CoordinateTemplate::new([DEFAULT_COORDINATES]).expect("valid template"),
        )
        .expect("Failed to create configuration")
        .with_fetcher(self.fetcher())
        .with_loader_cache(cache)
    }
}

pub fn module_manifest(coordinate: &Coordinate, requires: &[&str], classes: &[(&str, &str)]) -> String {
    let requires: Vec<String> = requires.iter().map(|r| format!("\"{}\"", r)).collect();
    let mut content = format!(
        "[module]\ngroup = \"{}\"\nname = \"{}\"\nversion = \"{}\"\nrequires = [{}]\n",
        coordinate.group(),
        coordinate.artifact(),
        coordinate.version(),
        requires.join(", ")
    );
    for (name, entry) in classes {
        content.push_str(&format!("\n[[class]]\nname = \"{}\"\nentry = \"{}\"\n", name, entry));
    }
    content
}
