//! Module manifest models.

use serde::{Deserialize, Serialize};

use super::{AppError, Coordinate};

/// Contents of a module artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleManifest {
    pub module: ModuleHeader,
    /// Classes exported by the module.
    #[serde(default, rename = "class")]
    pub classes: Vec<ClassDeclaration>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleHeader {
    pub group: String,
    pub name: String,
    pub version: String,
    /// Coordinates this module depends on; resolved transitively.
    #[serde(default)]
    pub requires: Vec<Coordinate>,
}

/// A class a module defines and the engine entry it binds to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassDeclaration {
    pub name: String,
    pub entry: String,
    #[serde(default = "default_methods")]
    pub methods: Vec<String>,
}

fn default_methods() -> Vec<String> {
    vec!["format".to_string()]
}

impl ModuleManifest {
    pub fn parse(content: &str, origin: &str) -> Result<Self, AppError> {
        let manifest: ModuleManifest = toml::from_str(content)
            .map_err(|err| AppError::ParseError { what: origin.to_string(), details: err.to_string() })?;
        manifest.validate(origin)?;
        Ok(manifest)
    }

    fn validate(&self, origin: &str) -> Result<(), AppError> {
        for class in &self.classes {
            if class.name.trim().is_empty() || class.entry.trim().is_empty() {
                return Err(AppError::ParseError {
                    what: origin.to_string(),
                    details: "class declarations need a non-empty name and entry".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn coordinate(&self) -> Result<Coordinate, AppError> {
        Coordinate::parse(&format!(
            "{}:{}:{}",
            self.module.group, self.module.name, self.module.version
        ))
    }
}
