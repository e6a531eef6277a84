pub mod artifact;
pub mod coordinate;
pub mod error;
pub mod module_manifest;
pub mod preferences;
pub mod version;
pub mod version_policy;

pub use artifact::{ArtifactDigest, ArtifactLocation, ArtifactSet, ResolvedArtifact};
pub use coordinate::{Coordinate, CoordinateTemplate};
pub use error::AppError;
pub use module_manifest::{ClassDeclaration, ModuleManifest};
pub use preferences::Preferences;
pub use version::{SupportedVersions, Version};
pub use version_policy::{VersionPolicy, VersionSelection};
