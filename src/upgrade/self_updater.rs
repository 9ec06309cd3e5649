//! Replacing the running executable with a verified release binary.
//!
//! [`SelfUpdater::perform_update`] goes through **download**, **verify**,
//! **backup** and **replace**. Nothing on disk outside a temporary directory is
//! touched until the new binary has passed checksum verification and a backup
//! of the current one exists.
//!
//! The replace step has three endings:
//!
//! | replace | restore | result                                   |
//! |---------|---------|------------------------------------------|
//! | ok      | -       | [`UpdateOutcome`], backup removed later  |
//! | failed  | ok      | [`JvError::RolledBack`] (replace phase)  |
//! | failed  | failed  | [`JvError::Unrecoverable`] with the backup path |

use super::backup::BackupManager;
use super::release::ReleaseInfo;
use crate::constants::{BACKUP_CLEANUP_GRACE, RESTORE_ATTEMPTS, RESTORE_RETRY_DELAY, UPDATE_TIMEOUT};
use crate::core::{JvError, UpdatePhase};
use crate::download::{Downloader, ProgressCallback};
use crate::verification::ChecksumVerifier;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Moves a new binary over the executable.
pub trait BinarySwap: Send + Sync {
    fn replace(&self, new_binary: &Path, executable: &Path) -> io::Result<()>;
}

impl<F> BinarySwap for F
where
    F: Fn(&Path, &Path) -> io::Result<()> + Send + Sync,
{
    fn replace(&self, new_binary: &Path, executable: &Path) -> io::Result<()> {
        self(new_binary, executable)
    }
}

/// Rename-based swap. On Windows the running executable is first moved aside,
/// because it can be renamed but not overwritten.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenameSwap;

impl BinarySwap for RenameSwap {
    fn replace(&self, new_binary: &Path, executable: &Path) -> io::Result<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(new_binary, std::fs::Permissions::from_mode(0o755))?;
        }

        if cfg!(windows) {
            let aside = executable.with_extension("old");
            let _ = std::fs::remove_file(&aside);
            std::fs::rename(executable, &aside)?;
            if let Err(e) = std::fs::rename(new_binary, executable) {
                let _ = std::fs::rename(&aside, executable);
                return Err(e);
            }
            return Ok(());
        }

        std::fs::rename(new_binary, executable)
    }
}

/// A completed update.
#[derive(Debug)]
pub struct UpdateOutcome {
    pub version: String,
    pub executable: PathBuf,
    pub backup_path: PathBuf,
    /// Removes the backup after the grace period.
    pub cleanup: JoinHandle<()>,
}

pub struct SelfUpdater {
    downloader: Downloader,
    executable: PathBuf,
    swap: Box<dyn BinarySwap>,
    timeout: Duration,
    cleanup_grace: Duration,
    restore_attempts: u32,
    restore_delay: Duration,
    progress: Option<ProgressCallback>,
}

impl SelfUpdater {
    /// Update `executable` using the default swap and timings.
    #[must_use]
    pub fn new(downloader: Downloader, executable: PathBuf) -> Self {
        Self {
            downloader,
            executable,
            swap: Box::new(RenameSwap),
            timeout: UPDATE_TIMEOUT,
            cleanup_grace: BACKUP_CLEANUP_GRACE,
            restore_attempts: RESTORE_ATTEMPTS,
            restore_delay: RESTORE_RETRY_DELAY,
            progress: None,
        }
    }

    /// Path of the running executable.
    pub fn current_executable() -> Result<PathBuf, JvError> {
        std::env::current_exe().map_err(|e| JvError::io("locate", "the running executable", e))
    }

    #[must_use]
    pub fn with_swap(mut self, swap: impl BinarySwap + 'static) -> Self {
        self.swap = Box::new(swap);
        self
    }

    /// Deadline for downloading and verifying the new binary.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn cleanup_grace(mut self, grace: Duration) -> Self {
        self.cleanup_grace = grace;
        self
    }

    #[must_use]
    pub const fn restore_policy(mut self, attempts: u32, delay: Duration) -> Self {
        self.restore_attempts = attempts;
        self.restore_delay = delay;
        self
    }

    #[must_use]
    pub fn on_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    #[must_use]
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    #[must_use]
    pub fn backup_manager(&self) -> BackupManager {
        BackupManager::new(self.executable.clone())
            .with_retry(self.restore_attempts, self.restore_delay)
    }

    /// Install `release` over the executable.
    pub async fn perform_update(&self, release: &ReleaseInfo) -> Result<UpdateOutcome, JvError> {
        info!(
            "Updating {} to {}",
            self.executable.display(),
            release.version
        );

        // Same directory as the executable so the swap is a rename.
        let parent = self.executable.parent().ok_or_else(|| JvError::InvalidInput {
            message: format!("executable '{}' has no parent", self.executable.display()),
        })?;
        let staging = tempfile::Builder::new()
            .prefix(".jv-update-")
            .tempdir_in(parent)
            .map_err(|e| {
                JvError::io("create update directory in", parent, e)
                    .in_update_phase(UpdatePhase::Download)
            })?;
        let new_binary = staging.path().join(release.download.file_name());

        match tokio::time::timeout(self.timeout, self.fetch(release, &new_binary)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(JvError::Timeout {
                    operation: format!("Downloading jv {}", release.version),
                    limit: self.timeout,
                }
                .in_update_phase(UpdatePhase::Download));
            }
        }

        let backup = self.backup_manager();
        backup
            .create_backup()
            .await
            .map_err(|e| e.in_update_phase(UpdatePhase::Backup))?;

        debug!("Replacing {}", self.executable.display());
        if let Err(replace_error) = self.swap.replace(&new_binary, &self.executable) {
            warn!("Replacing the executable failed: {replace_error}");
            return Err(self.roll_back(&backup, replace_error).await);
        }

        info!("Updated to {}", release.version);
        Ok(UpdateOutcome {
            version: release.version.clone(),
            executable: self.executable.clone(),
            backup_path: backup.backup_path().to_path_buf(),
            cleanup: backup.schedule_cleanup(self.cleanup_grace),
        })
    }

    async fn fetch(&self, release: &ReleaseInfo, dest: &Path) -> Result<(), JvError> {
        let package = &release.download;
        self.downloader
            .download(
                package.url(),
                dest,
                package.expected_size(),
                self.progress.as_ref(),
            )
            .await
            .map_err(|e| e.in_update_phase(UpdatePhase::Download))?;

        ChecksumVerifier::verify_async(
            dest.to_path_buf(),
            package.checksum().to_string(),
            package.algorithm(),
        )
        .await
        .map_err(|e| e.in_update_phase(UpdatePhase::Verify))
    }

    async fn roll_back(&self, backup: &BackupManager, replace_error: io::Error) -> JvError {
        match backup.restore_backup().await {
            Ok(()) => {
                if let Err(e) = backup.cleanup_backup().await {
                    warn!("Failed to remove backup after rollback: {e}");
                }
                JvError::RolledBack {
                    reason: replace_error.to_string(),
                }
                .in_update_phase(UpdatePhase::Replace)
            }
            Err(restore_error) => {
                error!(
                    "Restoring {} failed; backup kept at {}",
                    self.executable.display(),
                    backup.backup_path().display()
                );
                JvError::Unrecoverable {
                    update_error: replace_error.to_string(),
                    rollback_error: restore_error.to_string(),
                    backup_path: backup.backup_path().to_path_buf(),
                }
            }
        }
    }

    /// Restore a leftover backup over the executable and delete it.
    pub async fn rollback(&self) -> Result<PathBuf, JvError> {
        let backup = self.backup_manager();
        if !backup.backup_exists() {
            return Err(JvError::NotFound {
                what: format!("Backup {}", backup.backup_path().display()),
            });
        }
        backup.restore_backup().await?;
        backup.cleanup_backup().await?;
        Ok(self.executable.clone())
    }
}
