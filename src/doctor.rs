//! Health checks for the Java environment and jv's own state.
//!
//! [`Doctor::diagnose`] never fails; unreadable state is itself reported as a
//! failed check. [`Doctor::repair`] fixes what can be fixed without guessing:
//!
//! - a search path without exactly one `JAVA_HOME` reference is rewritten by
//!   setting the current home again
//! - inventory records whose directory is gone are dropped
//! - a leftover self-update backup is deleted
//!
//! An unset or invalid `JAVA_HOME` and an unreadable configuration file need
//! a decision from the user and are only reported.

use crate::config::Config;
use crate::core::JvError;
use crate::env::{EnvironmentManager, EnvironmentStore};
use crate::upgrade::BackupManager;
use crate::utils::platform::is_valid_java_home;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoctorStatus {
    Ok,
    Warning,
    Error,
}

/// A problem found by [`Doctor::diagnose`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Issue {
    HomeUnset,
    InvalidHome(PathBuf),
    /// The search path holds `count` references to the home `bin` directory
    /// instead of one.
    SearchPathReferences { count: usize },
    InventoryUnreadable { reason: String },
    VanishedInstall { version: String, path: PathBuf },
    StaleBackup(PathBuf),
}

impl Issue {
    #[must_use]
    pub const fn status(&self) -> DoctorStatus {
        match self {
            Self::HomeUnset | Self::InvalidHome(_) | Self::InventoryUnreadable { .. } => {
                DoctorStatus::Error
            }
            Self::SearchPathReferences { .. } | Self::VanishedInstall { .. } | Self::StaleBackup(_) => {
                DoctorStatus::Warning
            }
        }
    }

    /// Whether [`Doctor::repair`] handles this issue.
    #[must_use]
    pub const fn is_repairable(&self) -> bool {
        matches!(
            self,
            Self::SearchPathReferences { .. } | Self::VanishedInstall { .. } | Self::StaleBackup(_)
        )
    }

    /// What the user can do about it.
    #[must_use]
    pub fn fix(&self) -> String {
        match self {
            Self::HomeUnset | Self::InvalidHome(_) => {
                "Run `jv list` and then `jv use <version>`".to_string()
            }
            Self::InventoryUnreadable { .. } => {
                "Fix the JSON by hand or move the file away to start fresh".to_string()
            }
            Self::StaleBackup(_) => {
                "Run `jv update --rollback` to restore it, or `jv repair` to delete it".to_string()
            }
            Self::SearchPathReferences { .. } | Self::VanishedInstall { .. } => {
                "Run `jv repair`".to_string()
            }
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HomeUnset => write!(f, "JAVA_HOME is not set"),
            Self::InvalidHome(path) => {
                write!(f, "JAVA_HOME points to '{}', which is not a JDK", path.display())
            }
            Self::SearchPathReferences { count: 0 } => {
                write!(f, "The search path does not include JAVA_HOME's bin directory")
            }
            Self::SearchPathReferences { count } => write!(
                f,
                "The search path references JAVA_HOME's bin directory {count} times"
            ),
            Self::InventoryUnreadable { reason } => {
                write!(f, "The configuration file cannot be read: {reason}")
            }
            Self::VanishedInstall { version, path } => write!(
                f,
                "Installed Java {version} is missing from '{}'",
                path.display()
            ),
            Self::StaleBackup(path) => {
                write!(f, "A self-update backup was left at '{}'", path.display())
            }
        }
    }
}

/// One line of the report.
#[derive(Debug, Clone)]
pub struct DoctorCheck {
    pub name: &'static str,
    pub status: DoctorStatus,
    pub message: String,
    pub issue: Option<Issue>,
}

impl DoctorCheck {
    fn ok(name: &'static str, message: impl Into<String>) -> Self {
        Self {
            name,
            status: DoctorStatus::Ok,
            message: message.into(),
            issue: None,
        }
    }

    fn failed(name: &'static str, issue: Issue) -> Self {
        Self {
            name,
            status: issue.status(),
            message: issue.to_string(),
            issue: Some(issue),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DoctorResult {
    pub checks: Vec<DoctorCheck>,
    pub errors: usize,
    pub warnings: usize,
}

impl DoctorResult {
    fn push(&mut self, check: DoctorCheck) {
        match check.status {
            DoctorStatus::Error => self.errors += 1,
            DoctorStatus::Warning => self.warnings += 1,
            DoctorStatus::Ok => {}
        }
        self.checks.push(check);
    }

    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.errors == 0 && self.warnings == 0
    }

    pub fn issues(&self) -> impl Iterator<Item = &Issue> {
        self.checks.iter().filter_map(|check| check.issue.as_ref())
    }
}

/// What [`Doctor::repair`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairReport {
    pub repaired: Vec<String>,
    /// Issues left for the user.
    pub remaining: Vec<Issue>,
}

pub struct Doctor<'a, S> {
    env: &'a EnvironmentManager<S>,
    config_path: PathBuf,
    executable: Option<PathBuf>,
}

impl<'a, S: EnvironmentStore> Doctor<'a, S> {
    pub fn new(env: &'a EnvironmentManager<S>, config_path: impl Into<PathBuf>) -> Self {
        Self {
            env,
            config_path: config_path.into(),
            executable: None,
        }
    }

    /// Also look for a self-update backup of `executable`.
    #[must_use]
    pub fn with_executable(mut self, executable: PathBuf) -> Self {
        self.executable = Some(executable);
        self
    }

    #[must_use]
    pub fn diagnose(&self) -> DoctorResult {
        let mut result = DoctorResult::default();

        let home = self.check_home(&mut result);
        if let Some(home) = home {
            result.push(self.check_search_path(&home));
        }
        self.check_inventory(&mut result);
        if let Some(check) = self.check_backup() {
            result.push(check);
        }

        debug!(
            "Diagnosis: {} errors, {} warnings",
            result.errors, result.warnings
        );
        result
    }

    /// Returns the home directory when it is set, valid or not.
    fn check_home(&self, result: &mut DoctorResult) -> Option<PathBuf> {
        let location = self.env.store().location();
        match self.env.get_home() {
            Err(e) => {
                result.push(DoctorCheck {
                    name: "home",
                    status: DoctorStatus::Error,
                    message: format!("Cannot read {location}: {e}"),
                    issue: None,
                });
                None
            }
            Ok(None) => {
                result.push(DoctorCheck::failed("home", Issue::HomeUnset));
                None
            }
            Ok(Some(home)) if !is_valid_java_home(&home) => {
                result.push(DoctorCheck::failed("home", Issue::InvalidHome(home.clone())));
                Some(home)
            }
            Ok(Some(home)) => {
                result.push(DoctorCheck::ok(
                    "home",
                    format!("JAVA_HOME is {} ({location})", home.display()),
                ));
                Some(home)
            }
        }
    }

    fn check_search_path(&self, home: &Path) -> DoctorCheck {
        let list = match self.env.search_path() {
            Ok(list) => list,
            Err(e) => {
                return DoctorCheck {
                    name: "search_path",
                    status: DoctorStatus::Error,
                    message: format!("Cannot read the search path: {e}"),
                    issue: None,
                };
            }
        };
        let home = home.to_string_lossy();
        match self.env.rewriter().count_home_references(&list, Some(&home)) {
            1 => DoctorCheck::ok("search_path", "The search path includes JAVA_HOME's bin directory"),
            count => DoctorCheck::failed("search_path", Issue::SearchPathReferences { count }),
        }
    }

    fn check_inventory(&self, result: &mut DoctorResult) {
        let config = match Config::load_from(&self.config_path) {
            Ok(config) => config,
            Err(e) => {
                let reason = match e {
                    JvError::Config { reason, .. } => reason,
                    other => other.to_string(),
                };
                result.push(DoctorCheck::failed(
                    "inventory",
                    Issue::InventoryUnreadable { reason },
                ));
                return;
            }
        };

        let mut missing = 0;
        for record in config.installed_jdks.iter().filter(|r| !r.exists()) {
            missing += 1;
            result.push(DoctorCheck::failed(
                "inventory",
                Issue::VanishedInstall {
                    version: record.version.clone(),
                    path: record.path.clone(),
                },
            ));
        }
        if missing == 0 {
            result.push(DoctorCheck::ok(
                "inventory",
                format!(
                    "{} installed JDK(s) recorded in {}",
                    config.installed_jdks.len(),
                    self.config_path.display()
                ),
            ));
        }
    }

    fn check_backup(&self) -> Option<DoctorCheck> {
        let backup = BackupManager::new(self.executable.clone()?);
        Some(if backup.backup_exists() {
            DoctorCheck::failed("backup", Issue::StaleBackup(backup.backup_path().to_path_buf()))
        } else {
            DoctorCheck::ok("backup", "No leftover self-update backup")
        })
    }

    /// Fix the repairable issues in `result`.
    pub async fn repair(&self, result: &DoctorResult) -> Result<RepairReport, JvError> {
        let mut report = RepairReport::default();
        let mut vanished = Vec::new();

        for issue in result.issues() {
            match issue {
                Issue::SearchPathReferences { .. } => match self.env.get_home()? {
                    Some(home) if is_valid_java_home(&home) => {
                        self.env.set_home(&home)?;
                        report
                            .repaired
                            .push(format!("Rewrote the search path around {}", home.display()));
                    }
                    _ => report.remaining.push(issue.clone()),
                },
                Issue::VanishedInstall { path, .. } => vanished.push(path.clone()),
                Issue::StaleBackup(path) => {
                    if let Some(executable) = &self.executable {
                        BackupManager::new(executable.clone()).cleanup_backup().await?;
                        report.repaired.push(format!("Removed {}", path.display()));
                    }
                }
                other => report.remaining.push(other.clone()),
            }
        }

        if !vanished.is_empty() {
            let mut config = Config::load_from(&self.config_path)?;
            for path in &vanished {
                if let Some(record) = config.remove_installed(path) {
                    config.remove_custom_path(path);
                    report.repaired.push(format!(
                        "Dropped missing Java {} from the inventory",
                        record.version
                    ));
                }
            }
            config.save()?;
        }

        info!("Repaired {} issue(s)", report.repaired.len());
        Ok(report)
    }
}
