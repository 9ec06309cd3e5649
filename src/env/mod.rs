//! Environment store and the `JAVA_HOME` rewrite pipeline
//!
//! An [`EnvironmentStore`] reads and writes two persistent variables: the home
//! variable (`JAVA_HOME`) and the search path. On Windows the store is the
//! machine-wide registry environment ([`registry::RegistryStore`]); elsewhere it
//! is a shell profile snippet ([`profile::ProfileStore`]).
//!
//! [`EnvironmentManager::set_home`] performs the rewrite:
//!
//! 1. read the current home and search path (a missing search path is empty)
//! 2. write the new home
//! 3. write the rewritten search path (see [`path_list`])
//! 4. broadcast the change to running processes, best effort
//!
//! The two writes are not atomic as a pair. A reader between them may see the
//! new home with the old search path; the next `set_home` corrects both.

pub mod path_list;
pub mod profile;
#[cfg(windows)]
pub mod registry;

pub use path_list::PathListRewriter;
pub use profile::ProfileStore;

use crate::constants::{BIN_DIR, HOME_VAR, POSIX_SEARCH_PATH_VAR, WINDOWS_SEARCH_PATH_VAR};
use crate::core::JvError;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// The two variables jv manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvVar {
    Home,
    SearchPath,
}

/// Separator conventions of a search-path list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathFlavor {
    /// `;` between entries, `\` in paths, `%VAR%` references.
    Windows,
    /// `:` between entries, `/` in paths, `$VAR` references.
    Posix,
}

impl PathFlavor {
    #[must_use]
    pub const fn native() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Posix
        }
    }

    #[must_use]
    pub const fn list_separator(self) -> char {
        match self {
            Self::Windows => ';',
            Self::Posix => ':',
        }
    }

    #[must_use]
    pub const fn dir_separator(self) -> char {
        match self {
            Self::Windows => '\\',
            Self::Posix => '/',
        }
    }

    /// Reference to a variable's value in this flavor's syntax.
    #[must_use]
    pub fn var_reference(self, var: &str) -> String {
        match self {
            Self::Windows => format!("%{var}%"),
            Self::Posix => format!("${var}"),
        }
    }

    /// Reference to the `bin` directory below a variable, e.g. `$JAVA_HOME/bin`.
    #[must_use]
    pub fn bin_reference(self, var: &str) -> String {
        self.join(&self.var_reference(var), BIN_DIR)
    }

    /// Join `child` onto `base` with this flavor's separator.
    #[must_use]
    pub fn join(self, base: &str, child: &str) -> String {
        format!(
            "{}{}{child}",
            base.trim_end_matches(['\\', '/']),
            self.dir_separator()
        )
    }

    /// Name of the search-path variable.
    #[must_use]
    pub const fn search_path_var(self) -> &'static str {
        match self {
            Self::Windows => WINDOWS_SEARCH_PATH_VAR,
            Self::Posix => POSIX_SEARCH_PATH_VAR,
        }
    }
}

/// Persistent storage for the home variable and the search path.
pub trait EnvironmentStore: Send + Sync {
    /// List conventions of the stored search path.
    fn flavor(&self) -> PathFlavor;

    /// Read a variable; `Ok(None)` when it is not set.
    fn read(&self, var: EnvVar) -> Result<Option<String>, JvError>;

    /// Persist a variable. Fails with [`JvError::PrivilegeRequired`] when the
    /// store cannot be opened for writing.
    fn write(&self, var: EnvVar, value: &str) -> Result<(), JvError>;

    /// Tell running processes the environment changed.
    fn broadcast_change(&self) -> Result<(), JvError> {
        Ok(())
    }

    /// Human-readable location, used in messages.
    fn location(&self) -> String;

    /// Stored name of `var`.
    fn var_name(&self, var: EnvVar) -> &'static str {
        match var {
            EnvVar::Home => HOME_VAR,
            EnvVar::SearchPath => self.flavor().search_path_var(),
        }
    }
}

impl<S: EnvironmentStore + ?Sized> EnvironmentStore for Box<S> {
    fn flavor(&self) -> PathFlavor {
        (**self).flavor()
    }

    fn read(&self, var: EnvVar) -> Result<Option<String>, JvError> {
        (**self).read(var)
    }

    fn write(&self, var: EnvVar, value: &str) -> Result<(), JvError> {
        (**self).write(var, value)
    }

    fn broadcast_change(&self) -> Result<(), JvError> {
        (**self).broadcast_change()
    }

    fn location(&self) -> String {
        (**self).location()
    }

    fn var_name(&self, var: EnvVar) -> &'static str {
        (**self).var_name(var)
    }
}

/// The platform's default store type.
#[cfg(windows)]
pub type NativeStore = registry::RegistryStore;

/// The platform's default store type.
#[cfg(not(windows))]
pub type NativeStore = ProfileStore;

/// The store jv uses on this machine.
///
/// Unix processes without root fall back to the per-user profile snippet.
pub fn native_store() -> Result<NativeStore, JvError> {
    #[cfg(windows)]
    {
        Ok(registry::RegistryStore::new())
    }
    #[cfg(not(windows))]
    {
        if crate::utils::platform::is_elevated() {
            Ok(ProfileStore::system())
        } else {
            ProfileStore::user()
        }
    }
}

/// Applies home-variable changes to an [`EnvironmentStore`].
pub struct EnvironmentManager<S> {
    store: S,
    rewriter: PathListRewriter,
}

impl<S: EnvironmentStore> EnvironmentManager<S> {
    pub fn new(store: S) -> Self {
        let rewriter = PathListRewriter::new(store.flavor(), store.var_name(EnvVar::Home));
        Self { store, rewriter }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn rewriter(&self) -> &PathListRewriter {
        &self.rewriter
    }

    /// The stored home directory, if set.
    pub fn get_home(&self) -> Result<Option<PathBuf>, JvError> {
        Ok(self
            .store
            .read(EnvVar::Home)?
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from))
    }

    /// The stored search path, empty when unset.
    pub fn search_path(&self) -> Result<String, JvError> {
        Ok(self.store.read(EnvVar::SearchPath)?.unwrap_or_default())
    }

    /// Point the home variable at `home` and rewrite the search path around it.
    pub fn set_home(&self, home: &Path) -> Result<(), JvError> {
        let new_home = normalize_home(home)?;
        let old_home = self.get_home()?;
        let current = self.search_path()?;

        let old_home = old_home.map(|p| p.to_string_lossy().into_owned());
        let rewritten = self
            .rewriter
            .rewrite(&current, old_home.as_deref(), &new_home);

        self.store.write(EnvVar::Home, &new_home)?;
        self.store.write(EnvVar::SearchPath, &rewritten)?;
        info!("Set {} to {new_home} in {}", self.store.var_name(EnvVar::Home), self.store.location());
        debug!("Search path is now: {rewritten}");

        if let Err(e) = self.store.broadcast_change() {
            warn!("Failed to broadcast environment change: {e}");
        }
        Ok(())
    }
}

fn normalize_home(home: &Path) -> Result<String, JvError> {
    let text = home.to_string_lossy();
    let trimmed = text.trim().trim_matches('"');
    let without_trailing = trimmed.trim_end_matches(['\\', '/']);
    let normalized = if without_trailing.is_empty() || without_trailing.ends_with(':') {
        trimmed
    } else {
        without_trailing
    };
    if normalized.is_empty() {
        return Err(JvError::InvalidInput {
            message: "JAVA_HOME cannot be empty".to_string(),
        });
    }
    Ok(normalized.to_string())
}

/// Command that applies the new home to the shell the user is typing in.
///
/// Stores only affect new sessions; the current one needs this pasted.
#[must_use]
pub fn session_refresh_command(flavor: PathFlavor, home: &Path) -> String {
    let home = home.to_string_lossy();
    match flavor {
        PathFlavor::Windows => {
            let escaped = home.replace('\'', "''");
            format!("$env:JAVA_HOME = '{escaped}'; $env:Path = '{escaped}\\bin;' + $env:Path")
        }
        PathFlavor::Posix => {
            let escaped = home.replace('\'', "'\\''");
            format!("export JAVA_HOME='{escaped}'; export PATH=\"$JAVA_HOME/bin:$PATH\"")
        }
    }
}
