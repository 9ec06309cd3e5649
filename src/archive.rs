//! JDK archive extraction.
//!
//! Distributors ship zip files on Windows and gzip-compressed tarballs
//! elsewhere. Both are unpacked into a staging directory with every entry
//! checked first: absolute paths and `..` components are rejected with
//! [`JvError::InvalidArchive`] before anything lands outside the destination.
//!
//! While extracting, the first top-level directory accepted by a
//! [`RootMatcher`] is reported as the payload root. Packages usually wrap the
//! JDK in one directory such as `jdk-21.0.2+13`; when none matches, the whole
//! destination is the payload.

use crate::constants::DEFAULT_ROOT_PREFIX;
use crate::core::JvError;
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

/// Decides which top-level archive directory is the JDK payload.
pub trait RootMatcher: Send + Sync {
    fn matches(&self, name: &str) -> bool;
}

/// Accepts directories whose name starts with a prefix, ignoring case.
#[derive(Debug, Clone)]
pub struct PrefixMatcher {
    prefix: String,
}

impl PrefixMatcher {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into().to_lowercase(),
        }
    }
}

impl Default for PrefixMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT_PREFIX)
    }
}

impl RootMatcher for PrefixMatcher {
    fn matches(&self, name: &str) -> bool {
        name.to_lowercase().starts_with(&self.prefix)
    }
}

impl<F> RootMatcher for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn matches(&self, name: &str) -> bool {
        self(name)
    }
}

/// Container format, decided by file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    TarGz,
}

impl ArchiveKind {
    #[must_use]
    pub fn from_file_name(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        if lower.ends_with(".zip") {
            Some(Self::Zip)
        } else if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
            Some(Self::TarGz)
        } else {
            None
        }
    }
}

/// Result of a successful extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// The matched top-level directory, if any.
    pub root: Option<PathBuf>,
    /// Number of entries written.
    pub entries: usize,
}

impl Extraction {
    /// The directory holding the payload: the matched root or `dest` itself.
    #[must_use]
    pub fn payload(&self, dest: &Path) -> PathBuf {
        self.root.clone().unwrap_or_else(|| dest.to_path_buf())
    }
}

/// Extract `archive` into `dest`, choosing the format from its file name.
pub fn extract(archive: &Path, dest: &Path, matcher: &dyn RootMatcher) -> Result<Extraction, JvError> {
    let name = archive
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let kind = ArchiveKind::from_file_name(&name).ok_or_else(|| JvError::InvalidArchive {
        path: archive.to_path_buf(),
        reason: "unrecognised archive format".to_string(),
    })?;

    fs::create_dir_all(dest).map_err(|e| JvError::io("create directory", dest, e))?;
    let extraction = match kind {
        ArchiveKind::Zip => extract_zip(archive, dest, matcher)?,
        ArchiveKind::TarGz => extract_tar_gz(archive, dest, matcher)?,
    };
    info!(
        "Extracted {} entries from {} (root: {:?})",
        extraction.entries,
        archive.display(),
        extraction.root
    );
    Ok(extraction)
}

/// Reject absolute paths and parent-directory components.
fn checked_relative(archive: &Path, entry: &Path) -> Result<PathBuf, JvError> {
    let mut clean = PathBuf::new();
    for component in entry.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(JvError::InvalidArchive {
                    path: archive.to_path_buf(),
                    reason: format!("entry '{}' escapes the destination", entry.display()),
                });
            }
        }
    }
    Ok(clean)
}

struct RootTracker<'a> {
    matcher: &'a dyn RootMatcher,
    root: Option<String>,
}

impl<'a> RootTracker<'a> {
    fn new(matcher: &'a dyn RootMatcher) -> Self {
        Self {
            matcher,
            root: None,
        }
    }

    /// Observe an entry; only directories at the top level are candidates.
    fn observe(&mut self, relative: &Path, is_dir: bool) {
        if self.root.is_some() {
            return;
        }
        let mut components = relative.components();
        let Some(Component::Normal(first)) = components.next() else {
            return;
        };
        let is_top_level_dir = is_dir || components.next().is_some();
        let name = first.to_string_lossy();
        if is_top_level_dir && self.matcher.matches(&name) {
            debug!("Detected archive root '{name}'");
            self.root = Some(name.into_owned());
        }
    }

    fn finish(self, dest: &Path, entries: usize) -> Extraction {
        Extraction {
            root: self.root.map(|name| dest.join(name)),
            entries,
        }
    }
}

fn invalid(archive: &Path, e: impl std::fmt::Display) -> JvError {
    JvError::InvalidArchive {
        path: archive.to_path_buf(),
        reason: e.to_string(),
    }
}

fn extract_zip(archive: &Path, dest: &Path, matcher: &dyn RootMatcher) -> Result<Extraction, JvError> {
    let file = File::open(archive).map_err(|e| JvError::io("open", archive, e))?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| invalid(archive, e))?;
    let mut tracker = RootTracker::new(matcher);
    let mut entries = 0;

    for index in 0..zip.len() {
        let mut entry = zip.by_index(index).map_err(|e| invalid(archive, e))?;
        let raw = PathBuf::from(entry.name());
        let relative = checked_relative(archive, &raw)?;
        if entry.enclosed_name().is_none() {
            return Err(invalid(
                archive,
                format!("entry '{}' escapes the destination", entry.name()),
            ));
        }
        if relative.as_os_str().is_empty() {
            continue;
        }

        tracker.observe(&relative, entry.is_dir());
        let out_path = dest.join(&relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path).map_err(|e| JvError::io("create directory", &out_path, e))?;
        } else {
            if let Some(parent) = out_path.parent() {
                fs::create_dir_all(parent).map_err(|e| JvError::io("create directory", parent, e))?;
            }
            let mut out = File::create(&out_path).map_err(|e| JvError::io("create", &out_path, e))?;
            io::copy(&mut entry, &mut out).map_err(|e| invalid(archive, e))?;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                fs::set_permissions(&out_path, fs::Permissions::from_mode(mode & 0o777))
                    .map_err(|e| JvError::io("set permissions", &out_path, e))?;
            }
        }

        entries += 1;
    }

    Ok(tracker.finish(dest, entries))
}

fn extract_tar_gz(
    archive: &Path,
    dest: &Path,
    matcher: &dyn RootMatcher,
) -> Result<Extraction, JvError> {
    let file = File::open(archive).map_err(|e| JvError::io("open", archive, e))?;
    let mut tar = tar::Archive::new(GzDecoder::new(file));
    tar.set_preserve_permissions(true);
    let mut tracker = RootTracker::new(matcher);
    let mut entries = 0;

    for entry in tar.entries().map_err(|e| invalid(archive, e))? {
        let mut entry = entry.map_err(|e| invalid(archive, e))?;
        let raw = entry.path().map_err(|e| invalid(archive, e))?.into_owned();
        let relative = checked_relative(archive, &raw)?;
        if relative.as_os_str().is_empty() {
            continue;
        }

        let is_dir = entry.header().entry_type().is_dir();
        tracker.observe(&relative, is_dir);

        let unpacked = entry.unpack_in(dest).map_err(|e| invalid(archive, e))?;
        if !unpacked {
            return Err(invalid(
                archive,
                format!("entry '{}' escapes the destination", raw.display()),
            ));
        }
        entries += 1;
    }

    Ok(tracker.finish(dest, entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ArchiveFixture, write_fixture};
    use tempfile::TempDir;

    #[test]
    fn test_archive_kind_from_name() {
        assert_eq!(ArchiveKind::from_file_name("OpenJDK21.ZIP"), Some(ArchiveKind::Zip));
        assert_eq!(ArchiveKind::from_file_name("jdk.tar.gz"), Some(ArchiveKind::TarGz));
        assert_eq!(ArchiveKind::from_file_name("jdk.tgz"), Some(ArchiveKind::TarGz));
        assert_eq!(ArchiveKind::from_file_name("jdk.msi"), None);
    }

    #[test]
    fn test_extract_zip_detects_root() {
        let temp = TempDir::new().unwrap();
        let archive = write_fixture(temp.path(), "jdk.zip", &ArchiveFixture::jdk("jdk-21.0.2+13").zip());
        let dest = temp.path().join("out");

        let extraction = extract(&archive, &dest, &PrefixMatcher::default()).unwrap();
        let root = extraction.root.clone().unwrap();
        assert_eq!(root, dest.join("jdk-21.0.2+13"));
        assert!(crate::utils::is_valid_java_home(&root));
    }

    #[test]
    fn test_extract_tar_gz_detects_root() {
        let temp = TempDir::new().unwrap();
        let archive = write_fixture(
            temp.path(),
            "jdk.tar.gz",
            &ArchiveFixture::jdk("jdk-17.0.9+9").tar_gz(),
        );
        let dest = temp.path().join("out");

        let extraction = extract(&archive, &dest, &PrefixMatcher::default()).unwrap();
        assert_eq!(extraction.root, Some(dest.join("jdk-17.0.9+9")));
        assert!(crate::utils::is_valid_java_home(&dest.join("jdk-17.0.9+9")));
    }

    #[test]
    fn test_unmatched_root_falls_back_to_destination() {
        let temp = TempDir::new().unwrap();
        let archive = write_fixture(temp.path(), "jdk.zip", &ArchiveFixture::jdk("zulu21").zip());
        let dest = temp.path().join("out");

        let extraction = extract(&archive, &dest, &PrefixMatcher::default()).unwrap();
        assert_eq!(extraction.root, None);
        assert_eq!(extraction.payload(&dest), dest);
    }

    #[test]
    fn test_custom_matcher() {
        let temp = TempDir::new().unwrap();
        let archive = write_fixture(temp.path(), "jdk.zip", &ArchiveFixture::jdk("zulu21").zip());
        let dest = temp.path().join("out");

        let matcher = |name: &str| name.starts_with("zulu");
        let extraction = extract(&archive, &dest, &matcher).unwrap();
        assert_eq!(extraction.root, Some(dest.join("zulu21")));
    }

    #[test]
    fn test_zip_traversal_is_rejected() {
        let temp = TempDir::new().unwrap();
        let bytes = ArchiveFixture::new().file("../evil.txt", b"x").zip();
        let archive = write_fixture(temp.path(), "evil.zip", &bytes);
        let dest = temp.path().join("out");

        let err = extract(&archive, &dest, &PrefixMatcher::default()).unwrap_err();
        assert!(matches!(err, JvError::InvalidArchive { .. }));
        assert!(!temp.path().join("evil.txt").exists());
    }

    #[test]
    fn test_corrupt_archive_is_structure_error() {
        let temp = TempDir::new().unwrap();
        let archive = write_fixture(temp.path(), "broken.zip", b"not a zip file");
        let err = extract(&archive, &temp.path().join("out"), &PrefixMatcher::default()).unwrap_err();
        assert_eq!(err.class(), crate::core::ErrorClass::Structure);
    }

    #[cfg(unix)]
    #[test]
    fn test_zip_preserves_executable_bit() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let archive = write_fixture(temp.path(), "jdk.zip", &ArchiveFixture::jdk("jdk-21").zip());
        let dest = temp.path().join("out");
        extract(&archive, &dest, &PrefixMatcher::default()).unwrap();

        let java = dest.join("jdk-21").join("bin").join("java");
        let mode = fs::metadata(java).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
    }
}
