//! Moving a validated payload onto its final path.
//!
//! An existing directory at the target is first renamed to a hidden sibling and
//! deleted, then the payload is renamed into place. If that last rename fails
//! the target is left absent, never half-populated, and the removed install is
//! not brought back.

use crate::core::JvError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Promote `staged` to `target` with [`fs::rename`]. Returns whether an
/// existing install was replaced.
pub fn promote(staged: &Path, target: &Path) -> Result<bool, JvError> {
    promote_with(staged, target, |from, to| fs::rename(from, to))
}

/// [`promote`] with an injectable rename.
pub fn promote_with<F>(staged: &Path, target: &Path, rename: F) -> Result<bool, JvError>
where
    F: Fn(&Path, &Path) -> io::Result<()>,
{
    let parent = target.parent().ok_or_else(|| JvError::InvalidInput {
        message: format!("install path '{}' has no parent", target.display()),
    })?;
    fs::create_dir_all(parent).map_err(|e| JvError::io("create directory", parent, e))?;

    let mut replaced = false;
    if target.exists() {
        let trash = trash_path(target);
        debug!("Moving existing install {} aside to {}", target.display(), trash.display());
        rename(target, &trash).map_err(|e| JvError::PromotionFailed {
            staged: staged.to_path_buf(),
            target: target.to_path_buf(),
            reason: format!("could not remove the existing installation: {e}"),
        })?;
        replaced = true;
        if let Err(e) = fs::remove_dir_all(&trash) {
            warn!("Failed to delete {}: {e}", trash.display());
        }
    }

    rename(staged, target).map_err(|e| JvError::PromotionFailed {
        staged: staged.to_path_buf(),
        target: target.to_path_buf(),
        reason: e.to_string(),
    })?;

    info!("Installed to {}", target.display());
    Ok(replaced)
}

fn trash_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{name}.old-{}", std::process::id()))
}
