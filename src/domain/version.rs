use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::AppError;

/// A dotted-numeric version (e.g. "4.7.1"), compared componentwise with zero padding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    parts: Vec<u32>,
}

impl Version {
    /// Parse a version string into a `Version` object.
    ///
    /// Returns `None` if the string is empty or contains non-numeric segments.
    pub fn parse(s: &str) -> Option<Self> {
        if s.is_empty() {
            return None;
        }
        let parts: Result<Vec<u32>, _> = s.split('.').map(|segment| segment.parse::<u32>()).collect();
        parts.ok().map(|parts| Self { parts })
    }

    pub fn parts(&self) -> &[u32] {
        &self.parts
    }

    fn significant_parts(&self) -> &[u32] {
        let len = self.parts.iter().rposition(|part| *part != 0).map_or(0, |idx| idx + 1);
        &self.parts[..len]
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.parts.iter().map(u32::to_string).collect();
        write!(f, "{}", rendered.join("."))
    }
}

impl TryFrom<String> for Version {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Version::parse(&value)
            .ok_or_else(|| AppError::invalid_argument(format!("Malformed version '{}'", value)))
    }
}

impl From<Version> for String {
    fn from(value: Version) -> Self {
        value.to_string()
    }
}

// "1.0" and "1.0.0" are the same version; equality and hashing follow `Ord`.
impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl std::hash::Hash for Version {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.significant_parts().hash(state);
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let max_len = self.parts.len().max(other.parts.len());
        for idx in 0..max_len {
            let left_value = *self.parts.get(idx).unwrap_or(&0);
            let right_value = *other.parts.get(idx).unwrap_or(&0);
            match left_value.cmp(&right_value) {
                Ordering::Less => return Ordering::Less,
                Ordering::Greater => return Ordering::Greater,
                Ordering::Equal => {}
            }
        }
        Ordering::Equal
    }
}

/// The versions an engine supports, strictly ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedVersions {
    versions: Vec<Version>,
}

impl SupportedVersions {
    /// Build the set from version strings in any order.
    ///
    /// Duplicates collapse; an empty list or a malformed entry is a host configuration error.
    pub fn new<S: AsRef<str>>(versions: &[S]) -> Result<Self, AppError> {
        let mut parsed = Vec::with_capacity(versions.len());
        for raw in versions {
            let raw = raw.as_ref();
            let version = Version::parse(raw).ok_or_else(|| {
                AppError::config_error(format!("Supported version '{}' is malformed", raw))
            })?;
            parsed.push(version);
        }
        if parsed.is_empty() {
            return Err(AppError::config_error("At least one supported version is required"));
        }
        parsed.sort();
        parsed.dedup();
        Ok(Self { versions: parsed })
    }

    pub fn latest(&self) -> &Version {
        // Non-empty by construction.
        &self.versions[self.versions.len() - 1]
    }

    pub fn find(&self, candidate: &Version) -> Option<&Version> {
        self.versions.binary_search(candidate).ok().map(|idx| &self.versions[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Version> {
        self.versions.iter()
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

impl fmt::Display for SupportedVersions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.versions.iter().map(Version::to_string).collect();
        write!(f, "{}", rendered.join(", "))
    }
}
