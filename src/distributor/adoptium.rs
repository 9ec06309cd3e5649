//! Eclipse Adoptium (Temurin) builds from the Adoptium API.

use super::{Distributor, DownloadInfo, JavaRelease, Platform, VersionListing};
use crate::constants::ADOPTIUM_API_BASE;
use crate::core::JvError;
use crate::verification::ChecksumAlgorithm;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

/// Used when the release catalog cannot be fetched.
const FALLBACK_RELEASES: &[(&str, bool)] = &[
    ("25", true),
    ("24", false),
    ("23", false),
    ("22", false),
    ("21", true),
    ("20", false),
    ("19", false),
    ("18", false),
    ("17", true),
    ("16", false),
    ("11", true),
    ("8", true),
];

#[derive(Debug, Deserialize)]
struct AvailableReleases {
    #[serde(default)]
    available_lts_releases: Vec<u32>,
    #[serde(default)]
    available_releases: Vec<u32>,
}

#[derive(Debug, Deserialize)]
struct Asset {
    binary: Binary,
    #[serde(default)]
    release_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Binary {
    package: Package,
}

#[derive(Debug, Deserialize)]
struct Package {
    link: String,
    #[serde(default)]
    checksum: String,
    #[serde(default)]
    size: u64,
    name: String,
}

pub struct AdoptiumDistributor {
    client: reqwest::Client,
    base_url: String,
}

impl AdoptiumDistributor {
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, ADOPTIUM_API_BASE)
    }

    /// Point at another API root, e.g. a mirror or a test server.
    pub fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn fallback(reason: String) -> VersionListing {
        warn!("Using built-in version list: {reason}");
        VersionListing::fallback(
            FALLBACK_RELEASES
                .iter()
                .map(|(version, lts)| JavaRelease::new(*version, *lts))
                .collect(),
            reason,
        )
    }

    async fn fetch_releases(&self) -> Result<AvailableReleases, JvError> {
        let url = format!("{}/info/available_releases", self.base_url);
        debug!("GET {url}");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| JvError::transport(&url, &e))?;
        response.json().await.map_err(|e| JvError::Transport {
            url,
            reason: format!("invalid response: {e}"),
        })
    }

    fn os_name(platform: &Platform) -> Result<&'static str, JvError> {
        match platform.os {
            "windows" => Ok("windows"),
            "linux" => Ok("linux"),
            "macos" => Ok("mac"),
            _ => Err(unsupported(platform)),
        }
    }

    fn arch_name(platform: &Platform) -> Result<&'static str, JvError> {
        match platform.arch {
            "x86_64" => Ok("x64"),
            "x86" => Ok("x32"),
            "aarch64" => Ok("aarch64"),
            "arm" => Ok("arm"),
            _ => Err(unsupported(platform)),
        }
    }
}

fn unsupported(platform: &Platform) -> JvError {
    JvError::UnsupportedPlatform {
        os: platform.os.to_string(),
        arch: platform.arch.to_string(),
    }
}

#[async_trait]
impl Distributor for AdoptiumDistributor {
    fn id(&self) -> &str {
        "adoptium"
    }

    fn aliases(&self) -> &[&str] {
        &["temurin"]
    }

    fn name(&self) -> &str {
        "Eclipse Adoptium"
    }

    async fn available_versions(&self) -> VersionListing {
        match self.fetch_releases().await {
            Ok(releases) if !releases.available_releases.is_empty() => VersionListing::live(
                releases
                    .available_releases
                    .iter()
                    .map(|v| {
                        JavaRelease::new(v.to_string(), releases.available_lts_releases.contains(v))
                    })
                    .collect(),
            ),
            Ok(_) => Self::fallback("catalog returned no releases".to_string()),
            Err(e) => Self::fallback(e.to_string()),
        }
    }

    async fn download_info(
        &self,
        version: &str,
        platform: &Platform,
    ) -> Result<DownloadInfo, JvError> {
        let os = Self::os_name(platform)?;
        let arch = Self::arch_name(platform)?;
        let version = version.trim();
        let url = format!(
            "{}/assets/latest/{version}/hotspot?architecture={arch}&image_type=jdk&os={os}&vendor=eclipse",
            self.base_url
        );

        debug!("GET {url}");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| JvError::transport(&url, &e))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(JvError::NotFound {
                what: format!("Java {version} for {platform}"),
            });
        }
        let response = response
            .error_for_status()
            .map_err(|e| JvError::transport(&url, &e))?;
        let assets: Vec<Asset> = response.json().await.map_err(|e| JvError::Transport {
            url: url.clone(),
            reason: format!("invalid response: {e}"),
        })?;

        let Some(asset) = assets.into_iter().next() else {
            return Err(JvError::NotFound {
                what: format!("Java {version} for {platform}"),
            });
        };

        let package = asset.binary.package;
        let info = DownloadInfo::new(
            package.link,
            package.size,
            package.checksum,
            ChecksumAlgorithm::Sha256,
            &package.name,
        )?;
        Ok(match asset.release_name {
            Some(name) => info.with_release_name(name),
            None => info,
        })
    }
}
