use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::domain::Coordinate;
use crate::services::LocalRepositoryResolver;

/// Temporary local module repository.
pub struct ModuleRepository {
    root: TempDir,
}

impl ModuleRepository {
    pub fn new() -> Self {
        Self { root: TempDir::new().expect("Failed to create temp repository") }
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    pub fn resolver(&self) -> LocalRepositoryResolver {
        LocalRepositoryResolver::new(self.root.path())
    }

    /// Publish a module exporting `classes` as `(name, entry)` pairs.
    pub fn publish(&self, coordinate: &str, classes: &[(&str, &str)]) -> PathBuf {
        let coordinate = Coordinate::parse(coordinate).expect("valid coordinate");
        let path = self.resolver().artifact_path(&coordinate);
        fs::create_dir_all(path.parent().expect("artifact has parent")).expect("create dirs");

        let mut content = format!(
            "[module]\ngroup = \"{}\"\nname = \"{}\"\nversion = \"{}\"\n",
            coordinate.group(),
            coordinate.artifact(),
            coordinate.version()
        );
        for (name, entry) in classes {
            content.push_str(&format!("\n[[class]]\nname = \"{}\"\nentry = \"{}\"\n", name, entry));
        }
        fs::write(&path, content).expect("write module");
        path
    }
}
