//! Provisioner built on top of an artifact resolver.

use std::collections::BTreeSet;

use tracing::debug;

use super::CancellationToken;
use crate::domain::{AppError, ArtifactLocation, Coordinate};
use crate::ports::{ArtifactResolver, Provisioner};

/// Resolves each coordinate through `R` and unions the results.
#[derive(Debug, Clone)]
pub struct ResolverProvisioner<R> {
    resolver: R,
    cancellation: CancellationToken,
}

impl<R: ArtifactResolver> ResolverProvisioner<R> {
    pub fn new(resolver: R) -> Self {
        Self { resolver, cancellation: CancellationToken::new() }
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }
}

impl<R: ArtifactResolver> Provisioner for ResolverProvisioner<R> {
    fn provision(
        &self,
        coordinates: &BTreeSet<Coordinate>,
    ) -> Result<BTreeSet<ArtifactLocation>, AppError> {
        let mut artifacts = BTreeSet::new();
        for coordinate in coordinates {
            self.cancellation.check()?;
            let resolved = self.resolver.resolve(coordinate)?;
            debug!(%coordinate, artifacts = resolved.len(), "resolved coordinate");
            artifacts.extend(resolved);
        }
        Ok(artifacts)
    }
}
