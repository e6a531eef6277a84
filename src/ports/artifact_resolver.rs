//! Artifact resolver port definition.

use std::collections::BTreeSet;

use crate::domain::{AppError, ArtifactLocation, Coordinate};

/// Maps a single dependency coordinate to the local artifacts it brings in.
///
/// Implementations return the artifact for the coordinate itself plus anything it
/// requires transitively. Unresolvable coordinates fail with
/// [`AppError::ResolutionFailure`].
pub trait ArtifactResolver: Send + Sync {
    fn resolve(&self, coordinate: &Coordinate) -> Result<BTreeSet<ArtifactLocation>, AppError>;
}
