//! Records of JDKs installed by jv.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Where an installation lives and who may modify it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallScope {
    /// Machine-wide location; requires elevation.
    System,
    /// Under the user's home directory.
    User,
}

impl fmt::Display for InstallScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System => f.write_str("system"),
            Self::User => f.write_str("user"),
        }
    }
}

/// A JDK installed by jv, as stored under `installed_jdks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledJdk {
    pub version: String,
    /// The JDK root (the directory containing `bin`).
    pub path: PathBuf,
    /// Display name of the distributor it came from.
    pub distributor: String,
    pub installed_at: DateTime<Utc>,
    pub scope: InstallScope,
}

impl InstalledJdk {
    /// Whether the recorded directory is still present.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_dir()
    }

    /// Whether `target` names this record by version or dotted prefix.
    #[must_use]
    pub fn matches_version(&self, target: &str) -> bool {
        let target = target.trim();
        self.version == target || self.version.starts_with(&format!("{target}."))
    }
}
