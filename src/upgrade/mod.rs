//! Self-update for the jv binary.
//!
//! # Components
//!
//! - [`release`]: where the latest release and its checksum come from
//!   ([`GitHubReleaseSource`])
//! - [`version_check`]: ordinal version comparison and the skip marker
//!   ([`VersionChecker`])
//! - [`backup`]: the copy of the current executable that makes rollback possible
//! - [`self_updater`]: download, verify, backup, replace, roll back
//!   ([`SelfUpdater`])
//! - [`background`]: the rate-limited check that runs next to other commands
//! - [`config`]: `update_config` in `jv.json`
//!
//! # Update flow
//!
//! ```text
//! check ──► download ──► verify ──► backup ──► replace ──► succeeded
//!                                               │
//!                                               ▼ failed
//!                                         restore backup
//!                                          │          │
//!                                       ok ▼          ▼ failed
//!                                    rolled back   unrecoverable
//! ```
//!
//! Release metadata has no fallback. A release without a `SHA256SUMS.txt`
//! entry for this platform's binary cannot be installed.
//!
//! ```rust,no_run
//! use jv_cli::download::{Downloader, http_client};
//! use jv_cli::upgrade::{GitHubReleaseSource, SelfUpdater, VersionChecker};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), jv_cli::core::JvError> {
//! let client = http_client()?;
//! let checker = VersionChecker::new(
//!     env!("CARGO_PKG_VERSION"),
//!     Arc::new(GitHubReleaseSource::new(client.clone())),
//! );
//! let release = checker.latest().await?;
//! let updater = SelfUpdater::new(Downloader::new(client), SelfUpdater::current_executable()?);
//! let outcome = updater.perform_update(&release).await?;
//! outcome.cleanup.await.ok();
//! # Ok(())
//! # }
//! ```

pub mod background;
pub mod backup;
pub mod config;
pub mod release;
pub mod self_updater;
pub mod version_check;

#[cfg(test)]
mod tests;

pub use background::{BackgroundCheck, CheckReport, record_check};
pub use backup::BackupManager;
pub use config::UpdateConfig;
pub use release::{GitHubReleaseSource, ReleaseInfo, ReleaseSource};
pub use self_updater::{BinarySwap, RenameSwap, SelfUpdater, UpdateOutcome};
pub use version_check::{UpdateCheck, VersionChecker, is_newer, parse_release_version};
