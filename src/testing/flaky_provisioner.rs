use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::domain::{AppError, ArtifactLocation, Coordinate};
use crate::ports::{ArtifactResolver, Provisioner};
use crate::services::LocalRepositoryResolver;

/// Fails with a resolution failure for the first `failures` calls, then resolves normally.
pub struct FlakyProvisioner {
    resolver: LocalRepositoryResolver,
    failures: usize,
    calls: Arc<AtomicUsize>,
}

impl FlakyProvisioner {
    pub fn new(resolver: LocalRepositoryResolver, failures: usize) -> Self {
        Self { resolver, failures, calls: Arc::new(AtomicUsize::new(0)) }
    }

    /// Shared call counter, readable after the provisioner is moved into a configuration.
    pub fn counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

impl Provisioner for FlakyProvisioner {
    fn provision(
        &self,
        coordinates: &BTreeSet<Coordinate>,
    ) -> Result<BTreeSet<ArtifactLocation>, AppError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(AppError::resolution_failure("flaky", "repository unavailable"));
        }
        let mut artifacts = BTreeSet::new();
        for coordinate in coordinates {
            artifacts.extend(self.resolver.resolve(coordinate)?);
        }
        Ok(artifacts)
    }
}
