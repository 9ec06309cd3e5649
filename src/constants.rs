//! Global constants used throughout jv.
//!
//! Timeouts, environment variable names, well-known endpoints and file names
//! live here so the pipelines and the CLI agree on them.

use std::time::Duration;

/// Name of the environment variable holding the active JDK root.
pub const HOME_VAR: &str = "JAVA_HOME";

/// Name of the search-path variable on Windows (the registry preserves this casing).
pub const WINDOWS_SEARCH_PATH_VAR: &str = "Path";

/// Name of the search-path variable on Unix-like systems.
pub const POSIX_SEARCH_PATH_VAR: &str = "PATH";

/// Subdirectory of a JDK root containing its executables.
pub const BIN_DIR: &str = "bin";

/// Default prefix of the top-level directory inside a JDK archive.
pub const DEFAULT_ROOT_PREFIX: &str = "jdk";

/// macOS bundles keep the JDK root below this path inside the top-level directory.
pub const MACOS_BUNDLE_HOME: &str = "Contents/Home";

/// Prefix of staging directories created inside an install base.
pub const STAGING_PREFIX: &str = ".staging-";

/// Base URL of the Adoptium (Eclipse Temurin) API.
pub const ADOPTIUM_API_BASE: &str = "https://api.adoptium.net/v3";

/// Base URL of the GitHub REST API.
pub const GITHUB_API_BASE: &str = "https://api.github.com";

/// Repository publishing jv releases.
pub const RELEASE_REPOSITORY: &str = "CostaBrosky/jv";

/// Release asset listing SHA-256 checksums of every binary asset.
pub const CHECKSUMS_ASSET: &str = "SHA256SUMS.txt";

/// Overall deadline for an explicit self-update.
pub const UPDATE_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Deadline for the background update check.
pub const BACKGROUND_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// How long the CLI waits for the background check after a command finishes.
pub const BACKGROUND_NOTICE_WAIT: Duration = Duration::from_secs(1);

/// Overall deadline for a package install.
pub const INSTALL_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Connect timeout applied to every HTTP client.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Default interval between automatic update checks (one day).
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 24 * 60 * 60;

/// Grace period before a successful update deletes its backup.
pub const BACKUP_CLEANUP_GRACE: Duration = Duration::from_secs(2);

/// Attempts made when restoring a backup after a failed replace.
pub const RESTORE_ATTEMPTS: u32 = 3;

/// Delay between restore attempts.
pub const RESTORE_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Suffix appended to the executable name for the pre-update backup.
pub const BACKUP_SUFFIX: &str = "backup";

/// Overrides the configuration file location.
pub const CONFIG_ENV: &str = "JV_CONFIG";

/// Disables progress indicators when set.
pub const NO_PROGRESS_ENV: &str = "JV_NO_PROGRESS";

/// Disables the background update check when set.
pub const NO_UPDATE_CHECK_ENV: &str = "JV_NO_UPDATE_CHECK";

/// User agent sent with every HTTP request.
pub const USER_AGENT: &str = concat!("jv/", env!("CARGO_PKG_VERSION"));
