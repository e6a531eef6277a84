//! Decides where formatter implementation artifacts come from.

use std::collections::BTreeSet;

use tracing::debug;

use super::ModuleFetcher;
use crate::domain::{AppError, ArtifactSet, Coordinate, CoordinateTemplate, VersionSelection};
use crate::ports::Provisioner;

pub struct ModuleSource;

impl ModuleSource {
    /// Resolve the artifacts backing a selection.
    ///
    /// A module URL is used exclusively; otherwise the dependency override wins
    /// over the version-derived defaults.
    pub fn resolve(
        selection: &VersionSelection,
        dependency_override: Option<&Coordinate>,
        defaults: &CoordinateTemplate,
        provisioner: &dyn Provisioner,
        fetcher: &ModuleFetcher,
    ) -> Result<ArtifactSet, AppError> {
        let locations = match (selection, dependency_override) {
            (VersionSelection::ModuleUrl(url), _) => {
                debug!(%url, "using explicit module");
                BTreeSet::from([fetcher.fetch(url)?])
            }
            (VersionSelection::Version(_), Some(coordinate)) => {
                debug!(%coordinate, "using dependency override");
                provisioner.provision(&BTreeSet::from([coordinate.clone()]))?
            }
            (VersionSelection::Version(version), None) => {
                let coordinates: BTreeSet<Coordinate> = defaults.expand(version)?.into_iter().collect();
                debug!(%version, count = coordinates.len(), "using default dependencies");
                provisioner.provision(&coordinates)?
            }
        };

        if locations.is_empty() {
            return Err(AppError::resolution_failure(
                describe(selection, dependency_override),
                "no artifacts were provisioned",
            ));
        }
        ArtifactSet::from_locations(&locations)
    }
}

fn describe(selection: &VersionSelection, dependency_override: Option<&Coordinate>) -> String {
    match (selection, dependency_override) {
        (VersionSelection::ModuleUrl(url), _) => url.to_string(),
        (_, Some(coordinate)) => coordinate.to_string(),
        (VersionSelection::Version(version), None) => version.to_string(),
    }
}
