//! Selection of the version (or explicit module) governing dependency resolution.

use std::cmp::Ordering;

use url::Url;

use super::{AppError, SupportedVersions, Version};

/// URL schemes a module may be fetched from.
pub const MODULE_URL_SCHEMES: &[&str] = &["file", "http", "https"];

/// What a requested version string resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSelection {
    /// A supported engine version; dependencies derive from it.
    Version(Version),
    /// An explicit module location; dependency resolution by version is bypassed.
    ModuleUrl(Url),
}

pub struct VersionPolicy;

impl VersionPolicy {
    /// Resolve a requested version against the supported set.
    ///
    /// `None` selects the latest supported version. Anything that is neither a
    /// supported version nor a URL with a known scheme is rejected.
    pub fn resolve(
        requested: Option<&str>,
        supported: &SupportedVersions,
    ) -> Result<VersionSelection, AppError> {
        let Some(raw) = requested.map(str::trim) else {
            return Ok(VersionSelection::Version(supported.latest().clone()));
        };

        if let Some(version) = Version::parse(raw) {
            return supported.find(&version).cloned().map(VersionSelection::Version).ok_or_else(
                || {
                    AppError::invalid_argument(format!(
                        "Version '{}' is not supported. Supported versions: {}",
                        raw, supported
                    ))
                },
            );
        }

        Self::parse_module_url(raw).map(VersionSelection::ModuleUrl)
    }

    pub fn parse_module_url(raw: &str) -> Result<Url, AppError> {
        let url = Url::parse(raw).map_err(|err| {
            AppError::invalid_argument(format!(
                "'{}' is neither a supported version nor a valid module URL: {}",
                raw, err
            ))
        })?;
        if !MODULE_URL_SCHEMES.contains(&url.scheme()) {
            return Err(AppError::invalid_argument(format!(
                "Module URL '{}' uses unsupported protocol '{}'",
                raw,
                url.scheme()
            )));
        }
        Ok(url)
    }

    /// Compare `version` against a user-supplied version string, returning -1, 0, or 1.
    pub fn compare(version: &Version, other: Option<&str>) -> Result<i32, AppError> {
        let other = other
            .ok_or_else(|| AppError::invalid_argument("Cannot compare version to nothing"))?;
        let other = Version::parse(other.trim()).ok_or_else(|| {
            AppError::invalid_argument(format!("Malformed version '{}'", other))
        })?;
        Ok(match version.cmp(&other) {
            Ordering::Less => -1,
            Ordering::Equal => 0,
            Ordering::Greater => 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn supported() -> SupportedVersions {
        SupportedVersions::new(&["4.6.1", "4.6.3", "4.7.0", "4.7.1", "4.7.2"]).unwrap()
    }

    #[test]
    fn default_is_latest() {
        let selection = VersionPolicy::resolve(None, &supported()).unwrap();
        assert_eq!(selection, VersionSelection::Version(Version::parse("4.7.2").unwrap()));
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let err = VersionPolicy::resolve(Some("10.0.0"), &supported()).unwrap_err();
        assert!(matches!(err, AppError::InvalidUserArgument(_)));
    }

    #[test]
    fn file_url_selects_module() {
        let selection = VersionPolicy::resolve(Some("file:///tmp/module.toml"), &supported()).unwrap();
        assert!(matches!(selection, VersionSelection::ModuleUrl(url) if url.scheme() == "file"));
    }

    #[test]
    fn unknown_protocol_is_rejected() {
        let err = VersionPolicy::resolve(
            Some("invalidProtocol://some.domain/some.properties"),
            &supported(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidUserArgument(_)));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(VersionPolicy::resolve(Some("not a version"), &supported()).is_err());
    }

    #[test]
    fn compare_returns_sign() {
        let version = Version::parse("1.0.0").unwrap();
        assert_eq!(VersionPolicy::compare(&version, Some("1.0.0")).unwrap(), 0);
        assert_eq!(VersionPolicy::compare(&version, Some("10.0.0")).unwrap(), -1);
        assert_eq!(VersionPolicy::compare(&version, Some("0.0.1")).unwrap(), 1);
        assert!(VersionPolicy::compare(&version, None).is_err());
        assert!(VersionPolicy::compare(&version, Some("x.y")).is_err());
    }

    fn version_list() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec((0u32..20, 0u32..20, 0u32..20), 1..8).prop_map(|triples| {
            triples.into_iter().map(|(a, b, c)| format!("{a}.{b}.{c}")).collect()
        })
    }

    proptest! {
        #[test]
        fn absent_request_resolves_to_max(versions in version_list()) {
            let supported = SupportedVersions::new(&versions).unwrap();
            let max = versions.iter().filter_map(|v| Version::parse(v)).max().unwrap();
            prop_assert_eq!(
                VersionPolicy::resolve(None, &supported).unwrap(),
                VersionSelection::Version(max)
            );
        }

        #[test]
        fn supported_request_resolves_to_itself(versions in version_list(), pick in any::<prop::sample::Index>()) {
            let supported = SupportedVersions::new(&versions).unwrap();
            let requested = pick.get(&versions);
            prop_assert_eq!(
                VersionPolicy::resolve(Some(requested), &supported).unwrap(),
                VersionSelection::Version(Version::parse(requested).unwrap())
            );
        }
    }
}
