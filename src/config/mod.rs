//! Configuration and inventory persistence
//!
//! jv keeps all of its persistent state except the environment store in one JSON
//! file, `jv.json`:
//!
//! ```json
//! {
//!   "custom_paths": ["/opt/graalvm-21"],
//!   "search_paths": ["/srv/jdks"],
//!   "installed_jdks": [
//!     {
//!       "version": "21",
//!       "path": "/home/me/.jv/jdk-21",
//!       "distributor": "Eclipse Adoptium",
//!       "installed_at": "2024-05-01T10:00:00Z",
//!       "scope": "user"
//!     }
//!   ],
//!   "update_config": { "enabled": true, "auto_check": true }
//! }
//! ```
//!
//! # Location
//!
//! The first of these wins:
//! 1. `--config <path>` on the command line
//! 2. the `JV_CONFIG` environment variable
//! 3. `$XDG_CONFIG_HOME/jv/jv.json`
//! 4. `~/.config/jv/jv.json`
//!
//! A missing file yields the defaults. A UTF-8 byte order mark is stripped before
//! parsing, blank and duplicate custom paths are dropped on load, and every save
//! goes through an atomic rename so readers never observe a half-written file.
//!
//! The file is not locked; concurrent jv processes are serialised by the user.

pub mod inventory;

pub use inventory::{InstallScope, InstalledJdk};

use crate::constants::CONFIG_ENV;
use crate::core::JvError;
use crate::upgrade::config::UpdateConfig;
use crate::utils::fs::{atomic_write, path_key, paths_equal};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Contents of `jv.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Individual JDK roots registered with `jv add`.
    #[serde(default)]
    pub custom_paths: Vec<PathBuf>,

    /// Directories scanned for JDK roots.
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,

    /// JDKs installed by `jv install`.
    #[serde(default)]
    pub installed_jdks: Vec<InstalledJdk>,

    #[serde(default)]
    pub update_config: UpdateConfig,

    #[serde(skip)]
    path: PathBuf,
}

impl Config {
    /// Resolve the configuration path from an explicit override or the environment.
    pub fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf, JvError> {
        if let Some(path) = explicit {
            return Ok(path.to_path_buf());
        }
        if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
            return Ok(PathBuf::from(path));
        }
        Self::default_path()
    }

    /// `$XDG_CONFIG_HOME/jv/jv.json`, else `~/.config/jv/jv.json`.
    pub fn default_path() -> Result<PathBuf, JvError> {
        if let Some(config_home) = std::env::var_os("XDG_CONFIG_HOME").filter(|p| !p.is_empty()) {
            return Ok(PathBuf::from(config_home).join("jv").join("jv.json"));
        }
        let home = crate::utils::platform::get_home_dir()?;
        Ok(home.join(".config").join("jv").join("jv.json"))
    }

    /// Load from the resolved location.
    pub fn load(explicit: Option<&Path>) -> Result<Self, JvError> {
        let path = Self::resolve_path(explicit)?;
        Self::load_from(&path)
    }

    /// Load from `path`, returning defaults when it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, JvError> {
        if !path.exists() {
            debug!("No configuration at {}, using defaults", path.display());
            return Ok(Self::empty_at(path));
        }

        let data = std::fs::read(path).map_err(|e| JvError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let data = data.strip_prefix(UTF8_BOM).unwrap_or(&data);

        let mut config: Self = serde_json::from_slice(data).map_err(|e| JvError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        config.path = path.to_path_buf();
        config.sanitize();
        Ok(config)
    }

    /// Defaults bound to `path`.
    #[must_use]
    pub fn empty_at(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            ..Self::default()
        }
    }

    /// Where this configuration is saved.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the configuration atomically.
    pub fn save(&self) -> Result<(), JvError> {
        let content = serde_json::to_vec_pretty(self).map_err(|e| JvError::Config {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        atomic_write(&self.path, &content).map_err(|e| JvError::Config {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        debug!("Saved configuration to {}", self.path.display());
        Ok(())
    }

    fn sanitize(&mut self) {
        self.custom_paths = dedup_paths(std::mem::take(&mut self.custom_paths));
        self.search_paths = dedup_paths(std::mem::take(&mut self.search_paths));
    }

    /// Add or replace (by path) an inventory record.
    pub fn add_installed(&mut self, record: InstalledJdk) {
        match self
            .installed_jdks
            .iter_mut()
            .find(|existing| paths_equal(&existing.path, &record.path))
        {
            Some(existing) => *existing = record,
            None => self.installed_jdks.push(record),
        }
    }

    /// Remove the record for `path`, returning it.
    pub fn remove_installed(&mut self, path: &Path) -> Option<InstalledJdk> {
        let index = self
            .installed_jdks
            .iter()
            .position(|record| paths_equal(&record.path, path))?;
        Some(self.installed_jdks.remove(index))
    }

    #[must_use]
    pub fn installed_by_path(&self, path: &Path) -> Option<&InstalledJdk> {
        self.installed_jdks
            .iter()
            .find(|record| paths_equal(&record.path, path))
    }

    /// Add a custom JDK root. Returns false if it was already present or blank.
    pub fn add_custom_path(&mut self, path: &Path) -> bool {
        add_unique(&mut self.custom_paths, path)
    }

    pub fn remove_custom_path(&mut self, path: &Path) -> bool {
        remove_matching(&mut self.custom_paths, path)
    }

    #[must_use]
    pub fn has_custom_path(&self, path: &Path) -> bool {
        self.custom_paths.iter().any(|p| paths_equal(p, path))
    }

    /// Add a directory to scan. Returns false if it was already present or blank.
    pub fn add_search_path(&mut self, path: &Path) -> bool {
        add_unique(&mut self.search_paths, path)
    }

    pub fn remove_search_path(&mut self, path: &Path) -> bool {
        remove_matching(&mut self.search_paths, path)
    }
}

fn clean_path(path: &Path) -> Option<PathBuf> {
    let text = path.to_string_lossy();
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == "." {
        return None;
    }
    let without_trailing = trimmed.trim_end_matches(['\\', '/']);
    if without_trailing.is_empty() {
        // A filesystem root.
        return Some(PathBuf::from(trimmed));
    }
    Some(PathBuf::from(without_trailing))
}

fn dedup_paths(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    paths
        .into_iter()
        .filter_map(|p| clean_path(&p))
        .filter(|p| seen.insert(path_key(&p.to_string_lossy())))
        .collect()
}

fn add_unique(list: &mut Vec<PathBuf>, path: &Path) -> bool {
    let Some(path) = clean_path(path) else {
        return false;
    };
    if list.iter().any(|p| paths_equal(p, &path)) {
        return false;
    }
    list.push(path);
    true
}

fn remove_matching(list: &mut Vec<PathBuf>, path: &Path) -> bool {
    let before = list.len();
    list.retain(|p| !paths_equal(p, path));
    list.len() != before
}
