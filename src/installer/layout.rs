//! Where installed JDKs live.
//!
//! | scope  | final path                                         |
//! |--------|----------------------------------------------------|
//! | system | `<system root>/<distributor name>/jdk-<version>`   |
//! | user   | `<user root>/jdk-<version>`                        |
//!
//! The system root is `%ProgramFiles%` on Windows and `/opt` elsewhere; the
//! user root is `~/.jv`. Staging directories are created inside the same base
//! directory as the final path so promotion is a same-filesystem rename.

use crate::config::InstallScope;
use crate::core::JvError;
use crate::utils::platform::get_home_dir;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
    system_root: PathBuf,
    user_root: PathBuf,
}

impl InstallLayout {
    pub fn new(system_root: impl Into<PathBuf>, user_root: impl Into<PathBuf>) -> Self {
        Self {
            system_root: system_root.into(),
            user_root: user_root.into(),
        }
    }

    /// The platform defaults.
    pub fn from_environment() -> Result<Self, JvError> {
        let system_root = if cfg!(windows) {
            std::env::var_os("ProgramFiles")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(r"C:\Program Files"))
        } else {
            PathBuf::from("/opt")
        };
        let user_root = get_home_dir()?.join(".jv");
        Ok(Self::new(system_root, user_root))
    }

    #[must_use]
    pub fn user_root(&self) -> &Path {
        &self.user_root
    }

    #[must_use]
    pub fn system_root(&self) -> &Path {
        &self.system_root
    }

    /// Directory that holds installs (and staging) for a scope.
    #[must_use]
    pub fn base_dir(&self, scope: InstallScope, distributor_name: &str) -> PathBuf {
        match scope {
            InstallScope::System => self.system_root.join(sanitize(distributor_name)),
            InstallScope::User => self.user_root.clone(),
        }
    }

    /// Final directory for `version`.
    #[must_use]
    pub fn final_path(&self, scope: InstallScope, distributor_name: &str, version: &str) -> PathBuf {
        self.base_dir(scope, distributor_name)
            .join(format!("jdk-{}", sanitize(version)))
    }
}

/// Keep names usable as a single path component.
fn sanitize(component: &str) -> String {
    component
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c => c,
        })
        .collect::<String>()
        .trim_matches('.')
        .to_string()
}
