//! Removing JDKs installed by jv.

use crate::config::{Config, InstalledJdk};
use crate::constants::MACOS_BUNDLE_HOME;
use crate::core::JvError;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Delete the install recorded at `path` and drop it from `config`.
///
/// A directory that is already gone is not an error; the record is removed
/// either way. The configuration is saved only after the files are deleted.
pub fn uninstall(config: &mut Config, path: &Path) -> Result<InstalledJdk, JvError> {
    let record = config
        .installed_by_path(path)
        .cloned()
        .ok_or_else(|| JvError::NotFound {
            what: format!("Installed JDK at '{}'", path.display()),
        })?;

    let root = install_root(&record.path);
    match std::fs::remove_dir_all(&root) {
        Ok(()) => info!("Removed {}", root.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!("{} was already removed", root.display());
        }
        Err(e) => return Err(JvError::io("remove", root, e)),
    }

    config.remove_installed(&record.path);
    config.remove_custom_path(&record.path);
    config.save()?;
    Ok(record)
}

/// The promoted directory: the bundle root for a macOS layout, else the home.
fn install_root(home: &Path) -> PathBuf {
    if home.ends_with(MACOS_BUNDLE_HOME) {
        if let Some(root) = home.parent().and_then(Path::parent) {
            return root.to_path_buf();
        }
    }
    home.to_path_buf()
}
