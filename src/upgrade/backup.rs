//! Backup of the running executable during a self-update.
//!
//! The backup is a byte-for-byte copy next to the executable
//! (`jv` → `jv.backup`) with the same permissions. It is written before any
//! destructive step and is the only thing that makes a rollback possible, so
//! a failed backup aborts the update.

use crate::constants::{BACKUP_SUFFIX, RESTORE_ATTEMPTS, RESTORE_RETRY_DELAY};
use crate::core::JvError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Creates, restores and removes the backup of one executable.
#[derive(Debug, Clone)]
pub struct BackupManager {
    original_path: PathBuf,
    backup_path: PathBuf,
    attempts: u32,
    retry_delay: Duration,
}

impl BackupManager {
    /// Manage the backup of `executable_path`, stored as `<name>.backup` beside it.
    #[must_use]
    pub fn new(executable_path: PathBuf) -> Self {
        let mut backup_path = executable_path.clone();
        backup_path.set_file_name(format!(
            "{}.{BACKUP_SUFFIX}",
            executable_path.file_name().unwrap_or_default().to_string_lossy()
        ));

        Self {
            original_path: executable_path,
            backup_path,
            attempts: RESTORE_ATTEMPTS,
            retry_delay: RESTORE_RETRY_DELAY,
        }
    }

    /// How often, and how far apart, a restore is attempted.
    #[must_use]
    pub fn with_retry(mut self, attempts: u32, retry_delay: Duration) -> Self {
        self.attempts = attempts.max(1);
        self.retry_delay = retry_delay;
        self
    }

    /// Copy the executable to the backup path, replacing an older backup.
    pub async fn create_backup(&self) -> Result<(), JvError> {
        if !self.original_path.exists() {
            return Err(JvError::NotFound {
                what: format!("Executable {}", self.original_path.display()),
            });
        }

        if self.backup_path.exists() {
            debug!("Removing old backup at {}", self.backup_path.display());
            fs::remove_file(&self.backup_path)
                .await
                .map_err(|e| JvError::io("remove old backup", &self.backup_path, e))?;
        }

        info!("Creating backup at {}", self.backup_path.display());
        fs::copy(&self.original_path, &self.backup_path)
            .await
            .map_err(|e| JvError::io("create backup", &self.backup_path, e))?;

        #[cfg(unix)]
        {
            let metadata = fs::metadata(&self.original_path)
                .await
                .map_err(|e| JvError::io("read metadata of", &self.original_path, e))?;
            fs::set_permissions(&self.backup_path, metadata.permissions())
                .await
                .map_err(|e| JvError::io("set permissions on", &self.backup_path, e))?;
        }

        Ok(())
    }

    /// Copy the backup over the executable, retrying transient failures.
    ///
    /// The backup itself is left in place.
    pub async fn restore_backup(&self) -> Result<(), JvError> {
        if !self.backup_path.exists() {
            return Err(JvError::NotFound {
                what: format!("Backup {}", self.backup_path.display()),
            });
        }

        warn!("Restoring from backup at {}", self.backup_path.display());

        let mut attempt = 1;
        loop {
            match self.attempt_restore().await {
                Ok(()) => {
                    info!("Restored {} from backup", self.original_path.display());
                    return Ok(());
                }
                Err(e) if attempt < self.attempts => {
                    warn!("Restore attempt {attempt} failed: {e}. Retrying...");
                    tokio::time::sleep(self.retry_delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn attempt_restore(&self) -> Result<(), JvError> {
        if self.original_path.exists() {
            fs::remove_file(&self.original_path)
                .await
                .map_err(|e| JvError::io("remove", &self.original_path, e))?;
        }

        fs::copy(&self.backup_path, &self.original_path)
            .await
            .map_err(|e| JvError::io("restore backup to", &self.original_path, e))?;

        #[cfg(unix)]
        {
            let metadata = fs::metadata(&self.backup_path)
                .await
                .map_err(|e| JvError::io("read metadata of", &self.backup_path, e))?;
            fs::set_permissions(&self.original_path, metadata.permissions())
                .await
                .map_err(|e| JvError::io("set permissions on", &self.original_path, e))?;
        }

        Ok(())
    }

    /// Delete the backup if present.
    pub async fn cleanup_backup(&self) -> Result<(), JvError> {
        if self.backup_path.exists() {
            debug!("Cleaning up backup at {}", self.backup_path.display());
            fs::remove_file(&self.backup_path)
                .await
                .map_err(|e| JvError::io("remove backup", &self.backup_path, e))?;
        }
        Ok(())
    }

    /// Delete the backup after `grace`, logging instead of failing.
    pub fn schedule_cleanup(&self, grace: Duration) -> JoinHandle<()> {
        let manager = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            if let Err(e) = manager.cleanup_backup().await {
                warn!("Failed to remove backup: {e}");
            }
        })
    }

    #[must_use]
    pub fn backup_exists(&self) -> bool {
        self.backup_path.exists()
    }

    #[must_use]
    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    #[must_use]
    pub fn original_path(&self) -> &Path {
        &self.original_path
    }
}
