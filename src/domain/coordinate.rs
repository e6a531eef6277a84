use std::fmt;

use serde::{Deserialize, Serialize};

use super::{AppError, Version};

/// Placeholder substituted by [`CoordinateTemplate::expand`].
pub const VERSION_PLACEHOLDER: &str = "{version}";

/// Extension used when a coordinate does not name one.
pub const DEFAULT_EXTENSION: &str = "toml";

/// A validated dependency coordinate in Maven order:
/// `group:artifact[:extension[:classifier]]:version`.
///
/// Guarantees:
/// - Three to five non-empty segments
/// - Segments contain only alphanumeric characters, `-`, `_`, or `.`
/// - No segment is `.` or `..`, so the coordinate maps safely onto a directory layout
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Coordinate {
    group: String,
    artifact: String,
    extension: Option<String>,
    classifier: Option<String>,
    version: String,
}

impl Coordinate {
    /// Validate and create a new `Coordinate`.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let segments: Vec<&str> = raw.trim().split(':').collect();
        if !segments.iter().all(|segment| valid_segment(segment)) {
            return Err(malformed(raw));
        }
        let (group, artifact, extension, classifier, version) = match *segments.as_slice() {
            [group, artifact, version] => (group, artifact, None, None, version),
            [group, artifact, extension, version] => (group, artifact, Some(extension), None, version),
            [group, artifact, extension, classifier, version] => {
                (group, artifact, Some(extension), Some(classifier), version)
            }
            _ => return Err(malformed(raw)),
        };
        Ok(Self {
            group: group.to_string(),
            artifact: artifact.to_string(),
            extension: extension.map(str::to_string),
            classifier: classifier.map(str::to_string),
            version: version.to_string(),
        })
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn artifact(&self) -> &str {
        &self.artifact
    }

    pub fn extension(&self) -> &str {
        self.extension.as_deref().unwrap_or(DEFAULT_EXTENSION)
    }

    pub fn classifier(&self) -> Option<&str> {
        self.classifier.as_deref()
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// File name of the module manifest this coordinate points at.
    pub fn file_name(&self) -> String {
        match &self.classifier {
            Some(classifier) => {
                format!("{}-{}-{}.{}", self.artifact, self.version, classifier, self.extension())
            }
            None => format!("{}-{}.{}", self.artifact, self.version, self.extension()),
        }
    }
}

fn malformed(raw: &str) -> AppError {
    AppError::invalid_argument(format!(
        "Invalid dependency coordinate '{}': expected 'group:artifact[:extension[:classifier]]:version'",
        raw
    ))
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.artifact)?;
        if let Some(extension) = &self.extension {
            write!(f, ":{}", extension)?;
        }
        if let Some(classifier) = &self.classifier {
            write!(f, ":{}", classifier)?;
        }
        write!(f, ":{}", self.version)
    }
}

impl TryFrom<String> for Coordinate {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Coordinate::parse(&value)
    }
}

impl From<Coordinate> for String {
    fn from(value: Coordinate) -> Self {
        value.to_string()
    }
}

/// Coordinates an engine pulls in by default, with `{version}` standing in for the selected version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinateTemplate {
    patterns: Vec<String>,
}

impl CoordinateTemplate {
    pub fn new<S: Into<String>>(patterns: impl IntoIterator<Item = S>) -> Result<Self, AppError> {
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();
        if patterns.is_empty() {
            return Err(AppError::config_error("Coordinate template needs at least one pattern"));
        }
        // Probe with a dummy version so malformed patterns surface at definition time.
        for pattern in &patterns {
            Coordinate::parse(&pattern.replace(VERSION_PLACEHOLDER, "0")).map_err(|_| {
                AppError::config_error(format!("Invalid coordinate pattern '{}'", pattern))
            })?;
        }
        Ok(Self { patterns })
    }

    pub fn expand(&self, version: &Version) -> Result<Vec<Coordinate>, AppError> {
        let rendered = version.to_string();
        self.patterns
            .iter()
            .map(|pattern| Coordinate::parse(&pattern.replace(VERSION_PLACEHOLDER, &rendered)))
            .collect()
    }
}

fn valid_segment(segment: &str) -> bool {
    if segment.is_empty() || segment == "." || segment == ".." {
        return false;
    }
    segment.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
}
