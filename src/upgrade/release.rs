//! Release metadata for self-update.
//!
//! Unlike JDK listings there is no fallback here: if the latest release, its
//! binary for this platform or its published checksum cannot be determined,
//! the update fails.

use crate::constants::{CHECKSUMS_ASSET, GITHUB_API_BASE, RELEASE_REPOSITORY};
use crate::core::JvError;
use crate::distributor::{DownloadInfo, Platform};
use crate::verification::{ChecksumAlgorithm, ChecksumVerifier};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

/// A published release and the binary for one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    /// Version without a leading `v`, e.g. `0.6.0`.
    pub version: String,
    pub download: DownloadInfo,
}

/// Where the latest release is looked up.
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    async fn latest(&self, platform: &Platform) -> Result<ReleaseInfo, JvError>;
}

#[derive(Debug, Deserialize)]
struct GitHubRelease {
    tag_name: String,
    #[serde(default)]
    assets: Vec<GitHubAsset>,
}

#[derive(Debug, Deserialize)]
struct GitHubAsset {
    name: String,
    browser_download_url: String,
    #[serde(default)]
    size: u64,
}

/// Latest release of a GitHub repository.
pub struct GitHubReleaseSource {
    client: reqwest::Client,
    api_base: String,
    repository: String,
}

impl GitHubReleaseSource {
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_api_base(client, GITHUB_API_BASE, RELEASE_REPOSITORY)
    }

    pub fn with_api_base(
        client: reqwest::Client,
        api_base: impl Into<String>,
        repository: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            repository: repository.into(),
        }
    }

    async fn get_text(&self, url: &str) -> Result<String, JvError> {
        debug!("GET {url}");
        self.client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| JvError::transport(url, &e))?
            .text()
            .await
            .map_err(|e| JvError::transport(url, &e))
    }
}

#[async_trait]
impl ReleaseSource for GitHubReleaseSource {
    async fn latest(&self, platform: &Platform) -> Result<ReleaseInfo, JvError> {
        let url = format!("{}/repos/{}/releases/latest", self.api_base, self.repository);
        let body = self.get_text(&url).await?;
        let release: GitHubRelease =
            serde_json::from_str(&body).map_err(|e| JvError::ReleaseMetadata {
                reason: format!("unreadable release from {url}: {e}"),
            })?;

        let version = release
            .tag_name
            .trim()
            .trim_start_matches(['v', 'V'])
            .to_string();
        if version.is_empty() {
            return Err(JvError::ReleaseMetadata {
                reason: "release has no tag".to_string(),
            });
        }

        let binary = release
            .assets
            .iter()
            .find(|asset| is_binary_for(&asset.name, platform))
            .ok_or_else(|| JvError::ReleaseMetadata {
                reason: format!("release {version} has no binary for {platform}"),
            })?;
        let sums = release
            .assets
            .iter()
            .find(|asset| asset.name == CHECKSUMS_ASSET)
            .ok_or_else(|| JvError::ReleaseMetadata {
                reason: format!("release {version} does not publish {CHECKSUMS_ASSET}"),
            })?;

        let listing = self.get_text(&sums.browser_download_url).await?;
        let checksum = ChecksumVerifier::parse_checksums_file(&listing, &binary.name)
            .ok_or_else(|| JvError::ReleaseMetadata {
                reason: format!("{CHECKSUMS_ASSET} has no entry for {}", binary.name),
            })?;

        let download = DownloadInfo::new(
            &binary.browser_download_url,
            binary.size,
            checksum,
            ChecksumAlgorithm::Sha256,
            &binary.name,
        )?
        .with_release_name(release.tag_name.trim());

        Ok(ReleaseInfo { version, download })
    }
}

/// Whether `name` is the raw jv binary for `platform`.
///
/// Accepts `jv-<os>-<arch>` and `jv_<os>_<arch>` with Rust or Go platform
/// names, plus `.exe` on Windows.
fn is_binary_for(name: &str, platform: &Platform) -> bool {
    let name = name.to_lowercase();
    let stem = if platform.os == "windows" {
        match name.strip_suffix(".exe") {
            Some(stem) => stem,
            None => return false,
        }
    } else {
        name.as_str()
    };

    let os_names: &[&str] = match platform.os {
        "macos" => &["macos", "darwin"],
        os => &[os],
    };
    let arch_names: &[&str] = match platform.arch {
        "x86_64" => &["x86_64", "amd64"],
        "aarch64" => &["aarch64", "arm64"],
        "x86" => &["x86", "386"],
        arch => &[arch],
    };

    ['-', '_'].iter().any(|sep| {
        os_names.iter().any(|os| {
            arch_names
                .iter()
                .any(|arch| stem == format!("jv{sep}{os}{sep}{arch}"))
        })
    })
}
