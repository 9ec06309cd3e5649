//! Test utilities for jv
//!
//! Helpers shared by unit and integration tests:
//! - [`init_test_logging`] wires tracing to the test writer once per process
//! - [`MemoryStore`] is an in-memory [`EnvironmentStore`] with failure injection
//! - [`ArchiveFixture`] builds zip and tar.gz packages in memory
//! - [`StaticDistributor`] serves canned versions and download metadata
//!
//! # Example
//!
//! ```rust,no_run
//! use jv_cli::env::{EnvironmentManager, PathFlavor};
//! use jv_cli::test_utils::MemoryStore;
//! use std::path::Path;
//!
//! let manager = EnvironmentManager::new(MemoryStore::new(PathFlavor::Windows));
//! manager.set_home(Path::new(r"C:\jdk-21")).unwrap();
//! ```

use crate::core::JvError;
use crate::distributor::{Distributor, DownloadInfo, JavaRelease, Platform, VersionListing};
use crate::env::{EnvVar, EnvironmentStore, PathFlavor};
use crate::utils::platform::java_executable_name;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::Once;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::Level;
use tracing_subscriber::EnvFilter;

static INIT_LOGGING: Once = Once::new();

/// Initialise tracing for tests.
///
/// With `Some(level)` that level is used; otherwise `RUST_LOG` is honoured and
/// nothing is logged when it is unset.
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Lowercase hex SHA-256 of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// In-memory environment store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    flavor: Option<PathFlavor>,
    values: Mutex<HashMap<EnvVar, String>>,
    read_only: bool,
    fail_writes_of: Option<EnvVar>,
    fail_broadcast: bool,
    broadcasts: AtomicUsize,
}

impl MemoryStore {
    #[must_use]
    pub fn new(flavor: PathFlavor) -> Self {
        Self {
            flavor: Some(flavor),
            ..Self::default()
        }
    }

    /// Pre-set a variable.
    #[must_use]
    pub fn with(self, var: EnvVar, value: &str) -> Self {
        if let Ok(mut values) = self.values.lock() {
            values.insert(var, value.to_string());
        }
        self
    }

    /// Every write fails with [`JvError::PrivilegeRequired`].
    #[must_use]
    pub const fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Writes of `var` fail with a store error.
    #[must_use]
    pub const fn failing_writes_of(mut self, var: EnvVar) -> Self {
        self.fail_writes_of = Some(var);
        self
    }

    #[must_use]
    pub const fn failing_broadcast(mut self) -> Self {
        self.fail_broadcast = true;
        self
    }

    #[must_use]
    pub fn value(&self, var: EnvVar) -> Option<String> {
        self.values.lock().ok()?.get(&var).cloned()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.lock().map(|v| v.is_empty()).unwrap_or(true)
    }

    #[must_use]
    pub fn broadcasts(&self) -> usize {
        self.broadcasts.load(Ordering::SeqCst)
    }
}

impl EnvironmentStore for MemoryStore {
    fn flavor(&self) -> PathFlavor {
        self.flavor.unwrap_or(PathFlavor::Posix)
    }

    fn read(&self, var: EnvVar) -> Result<Option<String>, JvError> {
        Ok(self.value(var))
    }

    fn write(&self, var: EnvVar, value: &str) -> Result<(), JvError> {
        if self.read_only {
            return Err(JvError::PrivilegeRequired {
                operation: format!("write {}", self.var_name(var)),
            });
        }
        if self.fail_writes_of == Some(var) {
            return Err(JvError::Store {
                operation: format!("write {}", self.var_name(var)),
                store: self.location(),
                reason: "injected failure".to_string(),
            });
        }
        self.values
            .lock()
            .map_err(|e| JvError::Store {
                operation: "lock".to_string(),
                store: self.location(),
                reason: e.to_string(),
            })?
            .insert(var, value.to_string());
        Ok(())
    }

    fn broadcast_change(&self) -> Result<(), JvError> {
        self.broadcasts.fetch_add(1, Ordering::SeqCst);
        if self.fail_broadcast {
            return Err(JvError::Store {
                operation: "broadcast".to_string(),
                store: self.location(),
                reason: "injected failure".to_string(),
            });
        }
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

/// In-memory archive builder.
#[derive(Debug, Clone, Default)]
pub struct ArchiveFixture {
    entries: Vec<(String, Vec<u8>, u32)>,
}

impl ArchiveFixture {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A minimal JDK below `root`: `bin/<java launcher>` and a `release` file.
    #[must_use]
    pub fn jdk(root: &str) -> Self {
        Self::new()
            .executable(&format!("{root}/bin/{}", java_executable_name()), b"#!/bin/sh\n")
            .file(&format!("{root}/release"), b"JAVA_VERSION=\"21.0.2\"\n")
    }

    #[must_use]
    pub fn file(mut self, name: &str, content: &[u8]) -> Self {
        self.entries.push((name.to_string(), content.to_vec(), 0o644));
        self
    }

    #[must_use]
    pub fn executable(mut self, name: &str, content: &[u8]) -> Self {
        self.entries.push((name.to_string(), content.to_vec(), 0o755));
        self
    }

    /// Zip bytes, with an explicit entry for every parent directory.
    #[must_use]
    pub fn zip(&self) -> Vec<u8> {
        use zip::write::SimpleFileOptions;

        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let mut dirs_written = Vec::new();
        for (name, content, mode) in &self.entries {
            let mut prefix = String::new();
            let parts: Vec<&str> = name.split('/').collect();
            for part in &parts[..parts.len().saturating_sub(1)] {
                prefix.push_str(part);
                prefix.push('/');
                if part != &".." && !dirs_written.contains(&prefix) {
                    writer
                        .add_directory(prefix.as_str(), SimpleFileOptions::default().unix_permissions(0o755))
                        .expect("add directory");
                    dirs_written.push(prefix.clone());
                }
            }
            writer
                .start_file(name.as_str(), SimpleFileOptions::default().unix_permissions(*mode))
                .expect("start file");
            writer.write_all(content).expect("write entry");
        }
        writer.finish().expect("finish zip").into_inner()
    }

    /// Gzip-compressed tar bytes.
    #[must_use]
    pub fn tar_gz(&self) -> Vec<u8> {
        let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::fast());
        let mut builder = tar::Builder::new(encoder);
        for (name, content, mode) in &self.entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(*mode);
            header.set_cksum();
            builder
                .append_data(&mut header, name, content.as_slice())
                .expect("append entry");
        }
        builder
            .into_inner()
            .expect("finish tar")
            .finish()
            .expect("finish gzip")
    }
}

/// Write `bytes` to `dir/name` and return the path.
pub fn write_fixture(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).expect("write fixture");
    path
}

/// Distributor with canned responses.
pub struct StaticDistributor {
    id: String,
    name: String,
    releases: Vec<JavaRelease>,
    packages: HashMap<String, DownloadInfo>,
    requests: AtomicUsize,
}

impl StaticDistributor {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            releases: vec![JavaRelease::new("21", true), JavaRelease::new("17", true)],
            packages: HashMap::new(),
            requests: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn with_package(mut self, version: &str, info: DownloadInfo) -> Self {
        self.packages.insert(version.to_string(), info);
        self
    }

    /// Number of `download_info` calls served.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Distributor for StaticDistributor {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn available_versions(&self) -> VersionListing {
        VersionListing::live(self.releases.clone())
    }

    async fn download_info(
        &self,
        version: &str,
        platform: &Platform,
    ) -> Result<DownloadInfo, JvError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.packages.get(version).cloned().ok_or_else(|| JvError::NotFound {
            what: format!("Java {version} for {platform}"),
        })
    }
}
