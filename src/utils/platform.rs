//! Platform-specific helpers.

use crate::constants::{BIN_DIR, MACOS_BUNDLE_HOME};
use crate::core::JvError;
use std::path::{Path, PathBuf};

#[must_use]
pub const fn is_windows() -> bool {
    cfg!(windows)
}

pub fn get_home_dir() -> Result<PathBuf, JvError> {
    dirs::home_dir().ok_or_else(|| {
        let variable = if is_windows() {
            "USERPROFILE"
        } else {
            "HOME"
        };
        JvError::InvalidInput {
            message: format!("Could not determine the home directory; check that {variable} is set"),
        }
    })
}

/// File name of the Java launcher on this platform.
#[must_use]
pub const fn java_executable_name() -> &'static str {
    if is_windows() { "java.exe" } else { "java" }
}

/// Whether `path` is a JDK root, i.e. contains `bin/<java launcher>`.
#[must_use]
pub fn is_valid_java_home(path: &Path) -> bool {
    path.join(BIN_DIR).join(java_executable_name()).is_file()
}

/// Find the JDK root inside an extracted payload.
///
/// Returns the payload itself, or its macOS `Contents/Home` subdirectory.
#[must_use]
pub fn locate_java_home(payload: &Path) -> Option<PathBuf> {
    if is_valid_java_home(payload) {
        return Some(payload.to_path_buf());
    }
    let bundle = payload.join(MACOS_BUNDLE_HOME);
    is_valid_java_home(&bundle).then_some(bundle)
}

/// Whether the process may write machine-wide state.
#[cfg(unix)]
#[must_use]
pub fn is_elevated() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

/// Whether the process may write machine-wide state.
#[cfg(windows)]
#[must_use]
pub fn is_elevated() -> bool {
    crate::env::registry::RegistryStore::can_write()
}

/// Whether the process may write machine-wide state.
#[cfg(not(any(unix, windows)))]
#[must_use]
pub fn is_elevated() -> bool {
    false
}
