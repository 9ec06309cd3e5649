//! Finding JDKs on this machine.
//!
//! Candidates come from four places, later ones taking precedence when two
//! name the same directory:
//!
//! 1. well-known install roots for the platform (children of each root)
//! 2. `search_paths` from the configuration (children of each directory)
//! 3. `custom_paths` from the configuration (each path itself)
//! 4. the inventory of JDKs installed by jv
//!
//! Paths are compared case-insensitively and without trailing separators.

use crate::config::Config;
use crate::utils::fs::{path_key, paths_equal};
use crate::utils::platform::locate_java_home;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where a JDK was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JdkSource {
    /// Under a standard root or a configured search directory.
    Detected,
    /// Registered with `jv add`.
    Custom,
    /// Installed by `jv install`.
    Installed,
}

impl fmt::Display for JdkSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Detected => f.write_str("detected"),
            Self::Custom => f.write_str("custom"),
            Self::Installed => f.write_str("installed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JavaInstallation {
    pub version: String,
    /// JDK root (contains `bin`).
    pub path: PathBuf,
    pub source: JdkSource,
}

pub struct Detector {
    standard_roots: Vec<PathBuf>,
}

impl Default for Detector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector {
    /// A detector scanning this platform's standard roots.
    #[must_use]
    pub fn new() -> Self {
        Self::with_standard_roots(standard_roots())
    }

    #[must_use]
    pub fn with_standard_roots(standard_roots: Vec<PathBuf>) -> Self {
        Self { standard_roots }
    }

    /// Every JDK known from the system and `config`, newest version first.
    #[must_use]
    pub fn find_all(&self, config: &Config) -> Vec<JavaInstallation> {
        let mut found = Found::default();

        for root in self.standard_roots.iter().chain(&config.search_paths) {
            for home in scan_children(root) {
                found.insert(&home, version_of(&home), JdkSource::Detected);
            }
        }

        for path in &config.custom_paths {
            match locate_java_home(path) {
                Some(home) => found.insert(&home, version_of(&home), JdkSource::Custom),
                None => debug!("Custom path {} is not a JDK", path.display()),
            }
        }

        for record in config.installed_jdks.iter().filter(|r| r.exists()) {
            found.insert(&record.path, record.version.clone(), JdkSource::Installed);
        }

        let mut installs = found.items;
        installs.sort_by(|a, b| {
            version_key(&b.version)
                .cmp(&version_key(&a.version))
                .then_with(|| a.path.cmp(&b.path))
        });
        installs
    }
}

/// Find `target` among `installs`: exact version, then dotted prefix
/// (`21` matches `21.0.2`), then path.
#[must_use]
pub fn resolve<'a>(installs: &'a [JavaInstallation], target: &str) -> Option<&'a JavaInstallation> {
    let target = target.trim();
    if target.is_empty() {
        return None;
    }
    let prefix = format!("{target}.");

    installs
        .iter()
        .find(|i| i.version == target)
        .or_else(|| installs.iter().find(|i| i.version.starts_with(&prefix)))
        .or_else(|| installs.iter().find(|i| paths_equal(&i.path, Path::new(target))))
}

/// Version of the JDK at `home`: the `release` file, then the directory name.
#[must_use]
pub fn version_of(home: &Path) -> String {
    if let Some(version) = version_from_release_file(home) {
        return version;
    }
    let name = home
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    version_from_dir_name(&name).unwrap_or(name)
}

/// `JAVA_VERSION` from `<home>/release`.
#[must_use]
pub fn version_from_release_file(home: &Path) -> Option<String> {
    let content = fs::read_to_string(home.join("release")).ok()?;
    content.lines().find_map(|line| {
        let value = line.trim().strip_prefix("JAVA_VERSION=")?;
        let value = value.trim().trim_matches('"').trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}

/// Version embedded in names like `jdk-17.0.2`, `jdk1.8.0_322` or `java-11`.
#[must_use]
pub fn version_from_dir_name(name: &str) -> Option<String> {
    let lower = name.to_lowercase();
    ["jdk", "java"].iter().find_map(|marker| {
        lower.match_indices(marker).find_map(|(index, _)| {
            let rest = &lower[index + marker.len()..];
            let rest = rest.strip_prefix('-').unwrap_or(rest);
            if !rest.starts_with(|c: char| c.is_ascii_digit()) {
                return None;
            }
            let end = rest
                .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '_'))
                .unwrap_or(rest.len());
            let version = rest[..end].trim_end_matches(['.', '_']);
            (!version.is_empty()).then(|| version.to_string())
        })
    })
}

/// Numeric sort key: every run of digits in order.
fn version_key(version: &str) -> Vec<u64> {
    version
        .split(|c: char| !c.is_ascii_digit())
        .filter(|part| !part.is_empty())
        .map(|part| part.parse().unwrap_or(u64::MAX))
        .collect()
}

fn scan_children(root: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(root) else {
        return Vec::new();
    };
    entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .filter_map(|path| locate_java_home(&path))
        .collect()
}

#[derive(Default)]
struct Found {
    items: Vec<JavaInstallation>,
    index: HashMap<String, usize>,
}

impl Found {
    fn insert(&mut self, path: &Path, version: String, source: JdkSource) {
        let install = JavaInstallation {
            version,
            path: path.to_path_buf(),
            source,
        };
        let key = path_key(&path.to_string_lossy());
        match self.index.get(&key) {
            Some(&i) => self.items[i] = install,
            None => {
                self.index.insert(key, self.items.len());
                self.items.push(install);
            }
        }
    }
}

fn standard_roots() -> Vec<PathBuf> {
    if cfg!(windows) {
        let program_files = std::env::var_os("ProgramFiles")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(r"C:\Program Files"));
        let mut roots: Vec<PathBuf> = [
            "Java",
            "Eclipse Adoptium",
            "Eclipse Foundation",
            "Zulu",
            "Amazon Corretto",
            "Microsoft",
        ]
        .iter()
        .map(|vendor| program_files.join(vendor))
        .collect();
        if let Some(x86) = std::env::var_os("ProgramFiles(x86)") {
            roots.push(PathBuf::from(x86).join("Java"));
        }
        roots
    } else if cfg!(target_os = "macos") {
        vec![PathBuf::from("/Library/Java/JavaVirtualMachines")]
    } else {
        vec![PathBuf::from("/usr/lib/jvm"), PathBuf::from("/opt")]
    }
}
