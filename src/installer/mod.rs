//! JDK package installation.
//!
//! [`PackageInstaller::install`] runs one package through a fixed sequence of
//! phases:
//!
//! 1. **download** - resolve [`DownloadInfo`] from the distributor and stream the
//!    archive into a staging directory
//! 2. **verify** - compare the archive digest with the published checksum
//! 3. **extract** - unpack into the staging directory, rejecting unsafe entries
//! 4. **validate** - require a Java launcher inside the extracted root
//! 5. **promote** - move the root onto its final path, replacing any previous
//!    install of the same version
//!
//! Every failure is wrapped in [`JvError::Install`] naming the phase it
//! happened in. The staging directory is a [`tempfile::TempDir`] created inside
//! the install base, so it disappears on every exit path including a timeout,
//! and promotion is a rename on the same volume.
//!
//! Nothing is persisted until promotion succeeds. Recording the result in the
//! inventory is a separate step, [`PackageInstaller::install_and_record`], whose
//! failure is reported as the **record** phase while the installed files stay.
//!
//! # Example
//!
//! ```rust,no_run
//! use jv_cli::config::{Config, InstallScope};
//! use jv_cli::distributor::{DistributorRegistry, Platform};
//! use jv_cli::download::{Downloader, http_client};
//! use jv_cli::installer::{InstallLayout, InstallRequest, PackageInstaller};
//!
//! # async fn example() -> Result<(), jv_cli::core::JvError> {
//! let client = http_client()?;
//! let registry = DistributorRegistry::with_defaults(client.clone());
//! let installer = PackageInstaller::new(Downloader::new(client), InstallLayout::from_environment()?);
//!
//! let mut config = Config::load(None)?;
//! let request = InstallRequest::new(registry.get(None)?, "21", InstallScope::User, Platform::current());
//! let outcome = installer.install_and_record(&request, &mut config).await?;
//! println!("installed to {}", outcome.record.path.display());
//! # Ok(())
//! # }
//! ```

mod layout;
mod promote;
mod uninstall;


pub use layout::InstallLayout;
pub use promote::{promote, promote_with};
pub use uninstall::uninstall;

use crate::archive::{self, PrefixMatcher, RootMatcher};
use crate::config::{Config, InstallScope, InstalledJdk};
use crate::constants::{BIN_DIR, INSTALL_TIMEOUT, STAGING_PREFIX};
use crate::core::{InstallPhase, JvError};
use crate::distributor::{Distributor, DownloadInfo, Platform};
use crate::download::{Downloader, ProgressCallback};
use crate::utils::fs::ensure_dir;
use crate::utils::platform::{java_executable_name, locate_java_home};
use crate::verification::ChecksumVerifier;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Notified when the installer enters a phase.
pub type PhaseCallback = Arc<dyn Fn(InstallPhase) + Send + Sync>;

/// What to install and where.
pub struct InstallRequest<'a> {
    pub distributor: &'a dyn Distributor,
    pub version: &'a str,
    pub scope: InstallScope,
    pub platform: Platform,
}

impl<'a> InstallRequest<'a> {
    pub fn new(
        distributor: &'a dyn Distributor,
        version: &'a str,
        scope: InstallScope,
        platform: Platform,
    ) -> Self {
        Self {
            distributor,
            version,
            scope,
            platform,
        }
    }
}

/// Result of a completed install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    /// The inventory record describing the new install.
    pub record: InstalledJdk,
    /// Whether a previous install at the same path was replaced.
    pub replaced_existing: bool,
    /// Full release name reported by the distributor, if any.
    pub release_name: Option<String>,
}

pub struct PackageInstaller {
    downloader: Downloader,
    layout: InstallLayout,
    matcher: Arc<dyn RootMatcher>,
    elevated: bool,
    timeout: Duration,
    progress: Option<ProgressCallback>,
    on_phase: Option<PhaseCallback>,
}

impl PackageInstaller {
    /// An installer using the default root matcher and install deadline. The
    /// elevation flag is taken from the running process.
    #[must_use]
    pub fn new(downloader: Downloader, layout: InstallLayout) -> Self {
        Self {
            downloader,
            layout,
            matcher: Arc::new(PrefixMatcher::default()),
            elevated: crate::utils::platform::is_elevated(),
            timeout: INSTALL_TIMEOUT,
            progress: None,
            on_phase: None,
        }
    }

    #[must_use]
    pub fn with_root_matcher(mut self, matcher: impl RootMatcher + 'static) -> Self {
        self.matcher = Arc::new(matcher);
        self
    }

    /// Override the elevation check.
    #[must_use]
    pub const fn elevated(mut self, elevated: bool) -> Self {
        self.elevated = elevated;
        self
    }

    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Report download progress to `callback`.
    #[must_use]
    pub fn on_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    #[must_use]
    pub fn on_phase(mut self, callback: PhaseCallback) -> Self {
        self.on_phase = Some(callback);
        self
    }

    #[must_use]
    pub fn layout(&self) -> &InstallLayout {
        &self.layout
    }

    /// Install one package, bounded by the install deadline.
    pub async fn install(&self, request: &InstallRequest<'_>) -> Result<InstallOutcome, JvError> {
        match tokio::time::timeout(self.timeout, self.run(request)).await {
            Ok(result) => result,
            Err(_) => Err(JvError::Timeout {
                operation: format!("Installing Java {}", request.version.trim()),
                limit: self.timeout,
            }),
        }
    }

    /// [`Self::install`], then add the record to `config` and save it.
    ///
    /// User-scope installs are also registered as custom paths.
    pub async fn install_and_record(
        &self,
        request: &InstallRequest<'_>,
        config: &mut Config,
    ) -> Result<InstallOutcome, JvError> {
        let outcome = self.install(request).await?;

        self.enter(InstallPhase::Record);
        config.add_installed(outcome.record.clone());
        if outcome.record.scope == InstallScope::User {
            config.add_custom_path(&outcome.record.path);
        }
        config
            .save()
            .map_err(|e| e.in_install_phase(InstallPhase::Record))?;

        info!(
            "Recorded Java {} at {}",
            outcome.record.version,
            outcome.record.path.display()
        );
        Ok(outcome)
    }

    fn enter(&self, phase: InstallPhase) {
        debug!("Install phase: {phase}");
        if let Some(callback) = &self.on_phase {
            callback(phase);
        }
    }

    async fn run(&self, request: &InstallRequest<'_>) -> Result<InstallOutcome, JvError> {
        let version = request.version.trim();
        if version.is_empty() {
            return Err(JvError::InvalidInput {
                message: "no version given".to_string(),
            });
        }
        if request.scope == InstallScope::System && !self.elevated {
            return Err(JvError::PrivilegeRequired {
                operation: format!("install Java {version} for all users"),
            });
        }

        let distributor_name = request.distributor.name();
        let target = self
            .layout
            .final_path(request.scope, distributor_name, version);
        info!(
            "Installing {distributor_name} Java {version} ({}) into {}",
            request.scope,
            target.display()
        );

        self.enter(InstallPhase::Download);
        let package = request
            .distributor
            .download_info(version, &request.platform)
            .await
            .map_err(|e| e.in_install_phase(InstallPhase::Download))?;

        let base = self.layout.base_dir(request.scope, distributor_name);
        let staging = create_staging(&base).map_err(|e| e.in_install_phase(InstallPhase::Download))?;
        let archive_path = staging.path().join(package.file_name());
        self.download(&package, &archive_path)
            .await
            .map_err(|e| e.in_install_phase(InstallPhase::Download))?;

        self.enter(InstallPhase::Verify);
        ChecksumVerifier::verify_async(
            archive_path.clone(),
            package.checksum().to_string(),
            package.algorithm(),
        )
        .await
        .map_err(|e| e.in_install_phase(InstallPhase::Verify))?;

        self.enter(InstallPhase::Extract);
        let extract_dir = staging.path().join("extract");
        let payload = self
            .extract(archive_path, extract_dir)
            .await
            .map_err(|e| e.in_install_phase(InstallPhase::Extract))?;

        self.enter(InstallPhase::Validate);
        let java_home = locate_java_home(&payload).ok_or_else(|| {
            JvError::InvalidPackageStructure {
                reason: format!(
                    "{}/{} not found in the extracted package",
                    BIN_DIR,
                    java_executable_name()
                ),
            }
            .in_install_phase(InstallPhase::Validate)
        })?;
        let home_suffix = java_home
            .strip_prefix(&payload)
            .map(Path::to_path_buf)
            .unwrap_or_default();

        self.enter(InstallPhase::Promote);
        let promote_target = target.clone();
        let replaced_existing =
            tokio::task::spawn_blocking(move || promote(&payload, &promote_target))
                .await
                .map_err(|e| JvError::InvalidInput {
                    message: format!("promotion task failed: {e}"),
                })
                .and_then(|result| result)
                .map_err(|e| e.in_install_phase(InstallPhase::Promote))?;
        drop(staging);

        let home = if home_suffix.as_os_str().is_empty() {
            target
        } else {
            target.join(home_suffix)
        };
        info!("Java {version} is ready at {}", home.display());

        Ok(InstallOutcome {
            record: InstalledJdk {
                version: version.to_string(),
                path: home,
                distributor: distributor_name.to_string(),
                installed_at: Utc::now(),
                scope: request.scope,
            },
            replaced_existing,
            release_name: package.release_name().map(str::to_string),
        })
    }

    async fn download(&self, package: &DownloadInfo, dest: &Path) -> Result<(), JvError> {
        let bytes = self
            .downloader
            .download(
                package.url(),
                dest,
                package.expected_size(),
                self.progress.as_ref(),
            )
            .await?;
        debug!("Downloaded {bytes} bytes to {}", dest.display());
        Ok(())
    }

    async fn extract(&self, archive_path: PathBuf, dest: PathBuf) -> Result<PathBuf, JvError> {
        let matcher = Arc::clone(&self.matcher);
        tokio::task::spawn_blocking(move || {
            let extraction = archive::extract(&archive_path, &dest, matcher.as_ref())?;
            Ok(extraction.payload(&dest))
        })
        .await
        .map_err(|e| JvError::InvalidInput {
            message: format!("extraction task failed: {e}"),
        })?
    }
}

fn create_staging(base: &Path) -> Result<tempfile::TempDir, JvError> {
    ensure_dir(base)?;
    tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir_in(base)
        .map_err(|e| JvError::io("create staging directory in", base, e))
}
