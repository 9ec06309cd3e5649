//! Filesystem helpers.
//!
//! Persistent state (the configuration file, shell profiles) is always written
//! through [`atomic_write`] so a crash leaves either the old or the new content.

use crate::core::JvError;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Create a directory and all of its parents.
pub fn ensure_dir(path: &Path) -> Result<(), JvError> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| JvError::io("create directory", path, e))?;
    }
    Ok(())
}

/// Write `content` to `path` via a sibling temporary file and a rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<(), JvError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_dir(parent)?;
        }
    }

    let temp_path = path.with_extension("tmp");
    {
        let mut file =
            fs::File::create(&temp_path).map_err(|e| JvError::io("create", &temp_path, e))?;
        file.write_all(content)
            .map_err(|e| JvError::io("write", &temp_path, e))?;
        file.sync_all().map_err(|e| JvError::io("sync", &temp_path, e))?;
    }

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(JvError::io("replace", path, e));
    }
    Ok(())
}

/// Comparison key for a path: trimmed, without trailing separators, lowercase.
#[must_use]
pub fn path_key(path: &str) -> String {
    path.trim()
        .trim_matches('"')
        .trim_end_matches(['\\', '/'])
        .to_lowercase()
}

/// Case-insensitive path equality ignoring trailing separators.
#[must_use]
pub fn paths_equal(a: &Path, b: &Path) -> bool {
    path_key(&a.to_string_lossy()) == path_key(&b.to_string_lossy())
}
