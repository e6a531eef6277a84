//! Engine preferences loaded from `key=value` files.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::AppError;

/// Merged engine settings. Ordered so the canonical form is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Preferences {
    entries: BTreeMap<String, String>,
}

impl Preferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and merge files in order; later files override earlier keys.
    pub fn load_all(files: &[PathBuf]) -> Result<Self, AppError> {
        let mut merged = Self::new();
        for file in files {
            merged.merge(Self::load(file)?);
        }
        Ok(merged)
    }

    pub fn load(path: &Path) -> Result<Self, AppError> {
        if !path.is_file() {
            return Err(AppError::IllegalArgument(format!(
                "Preferences file not found: {}",
                path.display()
            )));
        }
        let content = decode(fs::read(path)?);
        Self::parse(&content, &path.display().to_string())
    }

    /// Parse `key=value` (or `key:value`) lines. Blank lines and `#`/`!` comments are skipped.
    pub fn parse(content: &str, origin: &str) -> Result<Self, AppError> {
        let mut entries = BTreeMap::new();
        for (idx, raw_line) in content.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            let separator = line.find(['=', ':']).ok_or_else(|| AppError::ParseError {
                what: origin.to_string(),
                details: format!("line {}: expected 'key=value', found '{}'", idx + 1, line),
            })?;
            let key = line[..separator].trim();
            if key.is_empty() {
                return Err(AppError::ParseError {
                    what: origin.to_string(),
                    details: format!("line {}: empty key", idx + 1),
                });
            }
            let value = line[separator + 1..].trim();
            entries.insert(key.to_string(), value.to_string());
        }
        Ok(Self { entries })
    }

    pub fn merge(&mut self, other: Preferences) {
        self.entries.extend(other.entries);
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// UTF-8 when valid, otherwise ISO-8859-1 where every byte is its own code point.
fn decode(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(content) => content,
        Err(err) => err.into_bytes().into_iter().map(char::from).collect(),
    }
}
