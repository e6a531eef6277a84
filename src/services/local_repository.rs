//! Artifact resolver over a local module repository.
//!
//! Layout: `<root>/<group with dots as directories>/<artifact>/<version>/<artifact>-<version>.toml`.
//! Each manifest may list `requires`; those are resolved transitively.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::domain::{AppError, ArtifactLocation, Coordinate, ModuleManifest};
use crate::ports::ArtifactResolver;

#[derive(Debug, Clone)]
pub struct LocalRepositoryResolver {
    root: PathBuf,
}

impl LocalRepositoryResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where the manifest for `coordinate` lives, whether or not it exists.
    pub fn artifact_path(&self, coordinate: &Coordinate) -> PathBuf {
        let mut path = self.root.clone();
        for segment in coordinate.group().split('.') {
            path.push(segment);
        }
        path.push(coordinate.artifact());
        path.push(coordinate.version());
        path.push(coordinate.file_name());
        path
    }

    fn collect(
        &self,
        coordinate: &Coordinate,
        visited: &mut BTreeSet<Coordinate>,
        artifacts: &mut BTreeSet<ArtifactLocation>,
    ) -> Result<(), AppError> {
        if !visited.insert(coordinate.clone()) {
            return Ok(());
        }

        let path = self.artifact_path(coordinate);
        if !path.is_file() {
            return Err(AppError::resolution_failure(
                coordinate.to_string(),
                format!("not found in repository {}", self.root.display()),
            ));
        }

        let content = fs::read_to_string(&path)
            .map_err(|err| AppError::resolution_failure(coordinate.to_string(), err.to_string()))?;
        let manifest = ModuleManifest::parse(&content, &path.display().to_string())?;
        artifacts.insert(ArtifactLocation::new(path));

        for required in &manifest.module.requires {
            self.collect(required, visited, artifacts)?;
        }
        Ok(())
    }
}

impl ArtifactResolver for LocalRepositoryResolver {
    fn resolve(&self, coordinate: &Coordinate) -> Result<BTreeSet<ArtifactLocation>, AppError> {
        let mut visited = BTreeSet::new();
        let mut artifacts = BTreeSet::new();
        self.collect(coordinate, &mut visited, &mut artifacts)?;
        debug!(%coordinate, count = artifacts.len(), "resolved from local repository");
        Ok(artifacts)
    }
}
