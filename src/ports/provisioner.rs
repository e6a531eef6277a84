//! Provisioner port definition.

use std::collections::BTreeSet;

use crate::domain::{AppError, ArtifactLocation, Coordinate};

/// Turns a set of coordinates into a deduplicated set of local artifacts.
///
/// Supplied by the host's dependency manager. Any unresolvable coordinate fails the
/// whole call with [`AppError::ResolutionFailure`].
pub trait Provisioner: Send + Sync {
    fn provision(
        &self,
        coordinates: &BTreeSet<Coordinate>,
    ) -> Result<BTreeSet<ArtifactLocation>, AppError>;
}

impl<F> Provisioner for F
where
    F: Fn(&BTreeSet<Coordinate>) -> Result<BTreeSet<ArtifactLocation>, AppError> + Send + Sync,
{
    fn provision(
        &self,
        coordinates: &BTreeSet<Coordinate>,
    ) -> Result<BTreeSet<ArtifactLocation>, AppError> {
        self(coordinates)
    }
}
