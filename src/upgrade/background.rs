//! The update check that runs alongside ordinary commands.
//!
//! It is rate limited by [`UpdateConfig::should_check`], bounded by a short
//! deadline, and never reports an error: a failed, slow or panicking check
//! simply produces no notice. The caller decides how long to wait for it once
//! its own command has finished.

use super::config::UpdateConfig;
use super::version_check::{UpdateCheck, VersionChecker};
use crate::config::Config;
use crate::constants::BACKGROUND_CHECK_TIMEOUT;
use chrono::{DateTime, Utc};
use std::path::Path;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// What a finished background check found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub checked_at: DateTime<Utc>,
    /// Version to announce, if newer and not skipped.
    pub available: Option<String>,
}

impl CheckReport {
    /// One-line notice for stderr.
    #[must_use]
    pub fn notice(&self, current_version: &str) -> Option<String> {
        self.available.as_ref().map(|latest| {
            format!("A new version of jv is available: {current_version} -> {latest} (run `jv update`)")
        })
    }
}

pub struct BackgroundCheck {
    handle: JoinHandle<Option<CheckReport>>,
}

impl BackgroundCheck {
    /// Start a check if the rate limiter allows one.
    #[must_use]
    pub fn spawn(checker: VersionChecker, config: &UpdateConfig) -> Option<Self> {
        Self::spawn_with_timeout(checker, config, BACKGROUND_CHECK_TIMEOUT)
    }

    #[must_use]
    pub fn spawn_with_timeout(
        checker: VersionChecker,
        config: &UpdateConfig,
        timeout: Duration,
    ) -> Option<Self> {
        let now = Utc::now();
        if !config.should_check(now) {
            debug!("Skipping background update check");
            return None;
        }

        let mut config = config.clone();
        let handle = tokio::spawn(async move {
            match tokio::time::timeout(timeout, checker.check(&mut config, now)).await {
                Ok(Ok(check)) => Some(CheckReport {
                    checked_at: now,
                    available: match check {
                        UpdateCheck::Available(release) => Some(release.version),
                        _ => None,
                    },
                }),
                Ok(Err(e)) => {
                    debug!("Background update check failed: {e}");
                    None
                }
                Err(_) => {
                    debug!("Background update check timed out");
                    None
                }
            }
        });
        Some(Self { handle })
    }

    /// Wait up to `wait` for the result; abandons the check afterwards.
    pub async fn finish(mut self, wait: Duration) -> Option<CheckReport> {
        match tokio::time::timeout(wait, &mut self.handle).await {
            Ok(Ok(report)) => report,
            Ok(Err(e)) => {
                debug!("Background update check aborted: {e}");
                None
            }
            Err(_) => {
                self.handle.abort();
                None
            }
        }
    }
}

/// Persist the time of a completed check, ignoring failures.
///
/// The configuration is reloaded so changes made by the command that ran in
/// the meantime are kept.
pub fn record_check(config_path: &Path, report: &CheckReport) {
    let result = Config::load_from(config_path).and_then(|mut config| {
        config.update_config.last_check = Some(report.checked_at);
        config.save()
    });
    if let Err(e) = result {
        debug!("Could not record update check: {e}");
    }
}
