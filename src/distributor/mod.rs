//! JDK distributors
//!
//! A [`Distributor`] is a catalog of downloadable JDKs. It answers two
//! questions: which feature versions exist ([`Distributor::available_versions`])
//! and where the package for one version and platform lives, together with its
//! published checksum ([`Distributor::download_info`]).
//!
//! Listing never fails: when the catalog is unreachable a built-in list is
//! returned and [`VersionListing::degraded`] says why. Resolving a download
//! does fail, because installing without a checksum is not allowed.
//!
//! Distributors are registered once in a [`DistributorRegistry`] and looked up
//! by identifier; the first registered one is the default.

pub mod adoptium;

pub use adoptium::AdoptiumDistributor;

use crate::core::JvError;
use crate::verification::ChecksumAlgorithm;
use async_trait::async_trait;
use std::fmt;
use std::path::Path;

/// A feature release offered by a distributor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JavaRelease {
    /// Feature version, e.g. `21`.
    pub version: String,
    pub is_lts: bool,
}

impl JavaRelease {
    pub fn new(version: impl Into<String>, is_lts: bool) -> Self {
        Self {
            version: version.into(),
            is_lts,
        }
    }

    fn sort_key(&self) -> Vec<u64> {
        self.version
            .split('.')
            .map(|part| part.parse().unwrap_or(0))
            .collect()
    }
}

/// Versions returned by a catalog, possibly from the built-in fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionListing {
    /// Newest first.
    pub releases: Vec<JavaRelease>,
    /// Why the built-in list was used instead of the live catalog.
    pub degraded: Option<String>,
}

impl VersionListing {
    /// A live listing, sorted newest first.
    #[must_use]
    pub fn live(mut releases: Vec<JavaRelease>) -> Self {
        sort_newest_first(&mut releases);
        Self {
            releases,
            degraded: None,
        }
    }

    /// A fallback listing with the reason the catalog was not used.
    #[must_use]
    pub fn fallback(mut releases: Vec<JavaRelease>, reason: impl Into<String>) -> Self {
        sort_newest_first(&mut releases);
        Self {
            releases,
            degraded: Some(reason.into()),
        }
    }

    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }
}

fn sort_newest_first(releases: &mut [JavaRelease]) {
    releases.sort_by(|a, b| b.sort_key().cmp(&a.sort_key()));
}

/// Everything needed to fetch and verify one package.
///
/// Constructed only through [`DownloadInfo::new`], which refuses a missing URL,
/// checksum or file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadInfo {
    url: String,
    size: u64,
    checksum: String,
    algorithm: ChecksumAlgorithm,
    file_name: String,
    release_name: Option<String>,
}

impl DownloadInfo {
    pub fn new(
        url: impl Into<String>,
        size: u64,
        checksum: impl Into<String>,
        algorithm: ChecksumAlgorithm,
        file_name: impl AsRef<str>,
    ) -> Result<Self, JvError> {
        let url = url.into();
        let checksum = checksum.into().trim().to_lowercase();
        // Only the final component is trusted; the name becomes a local path.
        let file_name = Path::new(file_name.as_ref().trim())
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let missing = if url.trim().is_empty() {
            Some("download URL")
        } else if checksum.is_empty() {
            Some("checksum")
        } else if file_name.is_empty() {
            Some("file name")
        } else {
            None
        };
        if let Some(field) = missing {
            return Err(JvError::ReleaseMetadata {
                reason: format!("package metadata has no {field}"),
            });
        }

        Ok(Self {
            url,
            size,
            checksum,
            algorithm,
            file_name,
            release_name: None,
        })
    }

    #[must_use]
    pub fn with_release_name(mut self, name: impl Into<String>) -> Self {
        self.release_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Expected size in bytes; zero when the publisher did not say.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    #[must_use]
    pub fn expected_size(&self) -> Option<u64> {
        (self.size > 0).then_some(self.size)
    }

    #[must_use]
    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    #[must_use]
    pub const fn algorithm(&self) -> ChecksumAlgorithm {
        self.algorithm
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Full release name, e.g. `21.0.2+13`, when the catalog reports it.
    #[must_use]
    pub fn release_name(&self) -> Option<&str> {
        self.release_name.as_deref()
    }
}

/// Operating system and CPU architecture, in Rust's naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    pub os: &'static str,
    pub arch: &'static str,
}

impl Platform {
    #[must_use]
    pub const fn new(os: &'static str, arch: &'static str) -> Self {
        Self { os, arch }
    }

    /// The platform this binary was built for.
    #[must_use]
    pub const fn current() -> Self {
        Self::new(std::env::consts::OS, std::env::consts::ARCH)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

/// A catalog of downloadable JDKs.
#[async_trait]
pub trait Distributor: Send + Sync {
    /// Identifier used on the command line, e.g. `adoptium`.
    fn id(&self) -> &str;

    /// Other identifiers accepted on the command line.
    fn aliases(&self) -> &[&str] {
        &[]
    }

    /// Display name recorded in the inventory, e.g. `Eclipse Adoptium`.
    fn name(&self) -> &str;

    /// Feature versions on offer, newest first. Never fails.
    async fn available_versions(&self) -> VersionListing;

    /// Package location and checksum for `version` on `platform`.
    async fn download_info(&self, version: &str, platform: &Platform)
    -> Result<DownloadInfo, JvError>;
}

/// Distributors known to jv, looked up by identifier.
pub struct DistributorRegistry {
    distributors: Vec<Box<dyn Distributor>>,
}

impl DistributorRegistry {
    /// A registry over `distributors`; the first is the default.
    #[must_use]
    pub fn new(distributors: Vec<Box<dyn Distributor>>) -> Self {
        Self { distributors }
    }

    /// The built-in distributors.
    #[must_use]
    pub fn with_defaults(client: reqwest::Client) -> Self {
        Self::new(vec![Box::new(AdoptiumDistributor::new(client))])
    }

    /// Look up by identifier or alias (case-insensitive); `None` selects the
    /// default.
    pub fn get(&self, id: Option<&str>) -> Result<&dyn Distributor, JvError> {
        let found = match id {
            None => self.distributors.first(),
            Some(id) => {
                let id = id.trim();
                self.distributors.iter().find(|d| {
                    d.id().eq_ignore_ascii_case(id)
                        || d.aliases().iter().any(|alias| alias.eq_ignore_ascii_case(id))
                })
            }
        };
        found.map(|d| d.as_ref()).ok_or_else(|| JvError::UnknownDistributor {
            id: id.unwrap_or_default().to_string(),
            available: self.ids().join(", "),
        })
    }

    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.distributors.iter().map(|d| d.id()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Distributor> {
        self.distributors.iter().map(|d| d.as_ref())
    }
}
