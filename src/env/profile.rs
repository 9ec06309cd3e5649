//! Shell profile store for Unix-like systems.
//!
//! Variables are persisted as a POSIX shell snippet that login shells source:
//!
//! ```sh
//! # Managed by jv. Changes to this file are overwritten.
//! export JAVA_HOME='/opt/temurin/jdk-21'
//! export PATH="$JAVA_HOME/bin${PATH:+:$PATH}"
//! ```
//!
//! The stored search path is the list jv prepends to the inherited `PATH`.
//! Machine-wide installs write `/etc/profile.d/jv.sh`; otherwise the snippet lives
//! next to the configuration file and has to be sourced from the user's profile.

use super::{EnvVar, EnvironmentStore, PathFlavor};
use crate::core::JvError;
use crate::utils::fs::atomic_write;
use std::io;
use std::path::{Path, PathBuf};

const HEADER: &str = "# Managed by jv. Changes to this file are overwritten.";
const HOME_PREFIX: &str = "export JAVA_HOME=";
const PATH_PREFIX: &str = "export PATH=\"";
const PATH_SUFFIX: &str = "${PATH:+:$PATH}\"";

/// Environment store backed by a sourced shell snippet.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    path: PathBuf,
}

#[derive(Debug, Default)]
struct ProfileValues {
    home: Option<String>,
    search_path: Option<String>,
}

impl ProfileStore {
    /// Store at an explicit location.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `/etc/profile.d/jv.sh`, read by every login shell.
    #[must_use]
    pub fn system() -> Self {
        Self::at("/etc/profile.d/jv.sh")
    }

    /// `jv/env.sh` in the user's configuration directory.
    pub fn user() -> Result<Self, JvError> {
        let config = crate::config::Config::default_path()?;
        let dir = config.parent().map_or_else(PathBuf::new, Path::to_path_buf);
        Ok(Self::at(dir.join("env.sh")))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<ProfileValues, JvError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(ProfileValues::default()),
            Err(e) => {
                return Err(JvError::Store {
                    operation: "read environment".to_string(),
                    store: self.location(),
                    reason: e.to_string(),
                });
            }
        };

        let mut values = ProfileValues::default();
        for line in content.lines().map(str::trim) {
            if let Some(value) = line.strip_prefix(HOME_PREFIX) {
                values.home = Some(unquote_single(value));
            } else if let Some(rest) = line.strip_prefix(PATH_PREFIX) {
                let list = rest.strip_suffix(PATH_SUFFIX).unwrap_or(rest);
                values.search_path = Some(unescape_double(list));
            }
        }
        Ok(values)
    }

    fn render(values: &ProfileValues) -> String {
        let mut out = String::from(HEADER);
        out.push('\n');
        if let Some(home) = &values.home {
            out.push_str(HOME_PREFIX);
            out.push_str(&quote_single(home));
            out.push('\n');
        }
        if let Some(list) = values.search_path.as_deref().filter(|l| !l.is_empty()) {
            out.push_str(PATH_PREFIX);
            out.push_str(&escape_double(list));
            out.push_str(PATH_SUFFIX);
            out.push('\n');
        }
        out
    }
}

impl EnvironmentStore for ProfileStore {
    fn flavor(&self) -> PathFlavor {
        PathFlavor::Posix
    }

    fn read(&self, var: EnvVar) -> Result<Option<String>, JvError> {
        let values = self.load()?;
        Ok(match var {
            EnvVar::Home => values.home,
            EnvVar::SearchPath => values.search_path,
        })
    }

    fn write(&self, var: EnvVar, value: &str) -> Result<(), JvError> {
        let mut values = self.load()?;
        match var {
            EnvVar::Home => values.home = Some(value.to_string()),
            EnvVar::SearchPath => values.search_path = Some(value.to_string()),
        }
        atomic_write(&self.path, Self::render(&values).as_bytes()).map_err(|e| match e {
            JvError::PrivilegeRequired { .. } => JvError::PrivilegeRequired {
                operation: format!("write {}", self.path.display()),
            },
            other => JvError::Store {
                operation: format!("write {}", self.var_name(var)),
                store: self.location(),
                reason: other.to_string(),
            },
        })
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

fn quote_single(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

fn unquote_single(value: &str) -> String {
    let value = value.trim();
    let inner = value
        .strip_prefix('\'')
        .and_then(|v| v.strip_suffix('\''))
        .unwrap_or(value);
    inner.replace("'\\''", "'")
}

fn escape_double(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '"' | '\\' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn unescape_double(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::EnvironmentManager;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_reads_as_unset() {
        let temp = TempDir::new().unwrap();
        let store = ProfileStore::at(temp.path().join("env.sh"));
        assert_eq!(store.read(EnvVar::Home).unwrap(), None);
        assert_eq!(store.read(EnvVar::SearchPath).unwrap(), None);
    }

    #[test]
    fn test_set_home_renders_snippet() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("jv").join("env.sh");
        let manager = EnvironmentManager::new(ProfileStore::at(&path));

        manager.set_home(Path::new("/opt/it's/jdk-21")).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(HEADER));
        assert!(content.contains("export JAVA_HOME='/opt/it'\\''s/jdk-21'"));
        assert!(content.contains("export PATH=\"$JAVA_HOME/bin${PATH:+:$PATH}\""));

        assert_eq!(
            manager.get_home().unwrap(),
            Some(PathBuf::from("/opt/it's/jdk-21"))
        );
        assert_eq!(manager.search_path().unwrap(), "$JAVA_HOME/bin");
    }

    #[test]
    fn test_write_preserves_other_variable() {
        let temp = TempDir::new().unwrap();
        let store = ProfileStore::at(temp.path().join("env.sh"));
        store.write(EnvVar::SearchPath, "$JAVA_HOME/bin:/opt/\"odd\"/bin").unwrap();
        store.write(EnvVar::Home, "/opt/jdk").unwrap();

        assert_eq!(store.read(EnvVar::Home).unwrap().as_deref(), Some("/opt/jdk"));
        assert_eq!(
            store.read(EnvVar::SearchPath).unwrap().as_deref(),
            Some("$JAVA_HOME/bin:/opt/\"odd\"/bin")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_unwritable_location_is_privilege_error() {
        use std::os::unix::fs::PermissionsExt;

        if crate::utils::platform::is_elevated() {
            return;
        }
        let temp = TempDir::new().unwrap();
        let locked = temp.path().join("locked");
        std::fs::create_dir(&locked).unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o555)).unwrap();

        let store = ProfileStore::at(locked.join("env.sh"));
        let err = store.write(EnvVar::Home, "/opt/jdk").unwrap_err();
        assert!(matches!(err, JvError::PrivilegeRequired { .. }));

        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
    }
}
