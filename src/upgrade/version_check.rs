//! Deciding whether an update is available.

use super::config::UpdateConfig;
use super::release::{ReleaseInfo, ReleaseSource};
use crate::core::{JvError, UpdatePhase};
use crate::distributor::Platform;
use chrono::{DateTime, Utc};
use semver::Version;
use std::sync::Arc;
use tracing::{debug, info};

/// Parse a release tag such as `v1.2.3` or `1.3.0-rc.1` as a semantic version.
#[must_use]
pub fn parse_release_version(text: &str) -> Option<Version> {
    Version::parse(text.trim().trim_start_matches(['v', 'V'])).ok()
}

/// Whether `candidate` is strictly newer than `current` in semver order, so
/// `1.3.0` is newer than `1.3.0-rc.1`. Unparsable versions are never newer.
#[must_use]
pub fn is_newer(candidate: &str, current: &str) -> bool {
    match (parse_release_version(candidate), parse_release_version(current)) {
        (Some(candidate), Some(current)) => candidate > current,
        _ => false,
    }
}

/// Result of an update check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateCheck {
    /// Updates are disabled in the configuration; nothing was fetched.
    Disabled,
    UpToDate { latest: String },
    /// Newer, but the user asked to skip this version.
    Skipped(ReleaseInfo),
    Available(ReleaseInfo),
}

impl UpdateCheck {
    /// The release to offer, if any.
    #[must_use]
    pub fn available(&self) -> Option<&ReleaseInfo> {
        match self {
            Self::Available(release) => Some(release),
            _ => None,
        }
    }
}

/// Compares the running version with the latest published release.
#[derive(Clone)]
pub struct VersionChecker {
    current_version: String,
    source: Arc<dyn ReleaseSource>,
    platform: Platform,
}

impl VersionChecker {
    pub fn new(current_version: impl Into<String>, source: Arc<dyn ReleaseSource>) -> Self {
        Self {
            current_version: current_version.into(),
            source,
            platform: Platform::current(),
        }
    }

    #[must_use]
    pub const fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    #[must_use]
    pub fn current_version(&self) -> &str {
        &self.current_version
    }

    /// Fetch the latest release without consulting the configuration.
    pub async fn latest(&self) -> Result<ReleaseInfo, JvError> {
        self.source
            .latest(&self.platform)
            .await
            .map_err(|e| e.in_update_phase(UpdatePhase::Check))
    }

    /// Check for an update and record the time of the check in `config`.
    pub async fn check(
        &self,
        config: &mut UpdateConfig,
        now: DateTime<Utc>,
    ) -> Result<UpdateCheck, JvError> {
        if !config.enabled {
            debug!("Update checks are disabled");
            return Ok(UpdateCheck::Disabled);
        }

        debug!("Checking for updates (current {})", self.current_version);
        let latest = self.latest().await?;
        config.last_check = Some(now);

        if !is_newer(&latest.version, &self.current_version) {
            debug!("Already on the latest version ({})", latest.version);
            return Ok(UpdateCheck::UpToDate {
                latest: latest.version,
            });
        }
        let skipped = config
            .skipped_version()
            .map(|v| v.trim_start_matches(['v', 'V']));
        if skipped == Some(latest.version.as_str()) {
            debug!("Version {} is skipped", latest.version);
            return Ok(UpdateCheck::Skipped(latest));
        }

        info!(
            "Update available: {} -> {}",
            self.current_version, latest.version
        );
        Ok(UpdateCheck::Available(latest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_release_versions() {
        assert_eq!(
            parse_release_version("v1.2.3"),
            parse_release_version("1.2.3")
        );
        assert_eq!(
            parse_release_version("V1.3.0-rc.1").map(|v| v.pre.to_string()),
            Some("rc.1".to_string())
        );
        assert!(parse_release_version("dev").is_none());
        assert!(parse_release_version("").is_none());
        assert!(parse_release_version("1.x.0").is_none());
    }

    #[test]
    fn test_semver_comparison() {
        assert!(is_newer("0.10.0", "0.9.9"));
        assert!(is_newer("v1.0.0", "0.99.0"));
        assert!(!is_newer("1.0.0", "1.0.0"));
        assert!(!is_newer("v1.0.0", "1.0.0+build.7"));
        assert!(!is_newer("0.9.0", "0.10.0"));
        assert!(!is_newer("1.0.0", "dev"));
    }

    #[test]
    fn test_prerelease_ordering() {
        assert!(is_newer("1.3.0", "1.3.0-rc.1"));
        assert!(is_newer("1.3.0-rc.2", "1.3.0-rc.1"));
        assert!(is_newer("1.3.0-rc.1", "1.2.9"));
        assert!(!is_newer("1.3.0-rc.1", "1.3.0"));
    }
}
