//! Local artifacts and their content identity.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::AppError;

/// A module file on local disk.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArtifactLocation(PathBuf);

impl ArtifactLocation {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    pub fn file_name(&self) -> String {
        self.0
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.0.display().to_string())
    }
}

impl fmt::Display for ArtifactLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Location-independent identity of one artifact: its file name and SHA-256 of its bytes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ArtifactDigest {
    pub file_name: String,
    pub sha256: String,
}

/// One resolved artifact with the bytes it was hashed from.
#[derive(Debug, Clone)]
pub struct ResolvedArtifact {
    pub location: ArtifactLocation,
    pub digest: ArtifactDigest,
    pub content: String,
}

/// A resolved set of artifacts, ordered by content identity.
///
/// Equality ignores where the files live, so the same modules cached in two
/// different directories compare equal.
#[derive(Debug, Clone, Default)]
pub struct ArtifactSet {
    artifacts: Vec<ResolvedArtifact>,
}

impl ArtifactSet {
    /// Read and hash every location. A location that cannot be read is a user error.
    pub fn from_locations(locations: &BTreeSet<ArtifactLocation>) -> Result<Self, AppError> {
        let mut artifacts = Vec::with_capacity(locations.len());
        for location in locations {
            let content = fs::read_to_string(location.path()).map_err(|err| {
                AppError::invalid_argument(format!("Cannot read artifact {}: {}", location, err))
            })?;
            let digest =
                ArtifactDigest { file_name: location.file_name(), sha256: hash_content(&content) };
            artifacts.push(ResolvedArtifact { location: location.clone(), digest, content });
        }
        artifacts.sort_by(|a, b| a.digest.cmp(&b.digest));
        artifacts.dedup_by(|a, b| a.digest == b.digest);
        Ok(Self { artifacts })
    }

    pub fn identity(&self) -> BTreeSet<ArtifactDigest> {
        self.artifacts.iter().map(|artifact| artifact.digest.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedArtifact> {
        self.artifacts.iter()
    }

    pub fn locations(&self) -> impl Iterator<Item = &ArtifactLocation> {
        self.artifacts.iter().map(|artifact| &artifact.location)
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

impl PartialEq for ArtifactSet {
    fn eq(&self, other: &Self) -> bool {
        self.artifacts.len() == other.artifacts.len()
            && self.artifacts.iter().zip(&other.artifacts).all(|(a, b)| a.digest == b.digest)
    }
}

impl Eq for ArtifactSet {}

impl std::hash::Hash for ArtifactSet {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        for artifact in &self.artifacts {
            artifact.digest.hash(state);
        }
    }
}

pub fn hash_content(content: &str) -> String {
    hash_bytes(content.as_bytes())
}

pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    digest.iter().map(|byte| format!("{:02x}", byte)).collect()
}
