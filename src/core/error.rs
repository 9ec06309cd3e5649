//! Error handling for jv
//!
//! Every failure surfaced by the library is a [`JvError`]. Each variant maps to one
//! [`ErrorClass`], which is what callers branch on: transport failures may be
//! retried by the user, integrity and structure failures mean the artifact itself
//! is bad, privilege failures need elevation, and [`ErrorClass::Unrecoverable`]
//! means the self-update could not restore the original executable.
//!
//! Install and update failures are wrapped in [`JvError::Install`] and
//! [`JvError::Update`] so the message names the phase that failed while
//! [`JvError::class`] still reports the class of the underlying cause.
//!
//! The CLI converts errors with [`user_friendly_error`], which attaches a
//! suggestion and details to the most common failures:
//!
//! ```rust,no_run
//! use jv_cli::core::{JvError, user_friendly_error};
//!
//! let error = JvError::PrivilegeRequired {
//!     operation: "set JAVA_HOME".to_string(),
//! };
//! user_friendly_error(error.into()).display();
//! ```

use colored::Colorize;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failure class of a [`JvError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Network unreachable, bad status, interrupted or short transfer.
    Transport,
    /// Checksum mismatch or unsupported checksum algorithm.
    Integrity,
    /// Malformed archive, unsafe entry, or missing runtime executable.
    Structure,
    /// The operation needs elevation the process does not have.
    Privilege,
    /// Reading or writing persistent state (store, inventory, filesystem) failed.
    Persistence,
    /// A self-update failed and the original executable could not be restored.
    Unrecoverable,
    /// Anything else: bad input, unknown names, unsupported platforms.
    Other,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Transport => "transport",
            Self::Integrity => "integrity",
            Self::Structure => "structure",
            Self::Privilege => "privilege",
            Self::Persistence => "persistence",
            Self::Unrecoverable => "unrecoverable",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

/// Step of the package install pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallPhase {
    Download,
    Verify,
    Extract,
    Validate,
    Promote,
    Record,
}

impl fmt::Display for InstallPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Download => "download",
            Self::Verify => "verify",
            Self::Extract => "extract",
            Self::Validate => "validate",
            Self::Promote => "promote",
            Self::Record => "record",
        };
        f.write_str(name)
    }
}

/// Step of the self-update pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePhase {
    Check,
    Download,
    Verify,
    Backup,
    Replace,
}

impl fmt::Display for UpdatePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Check => "check",
            Self::Download => "download",
            Self::Verify => "verify",
            Self::Backup => "backup",
            Self::Replace => "replace",
        };
        f.write_str(name)
    }
}

/// Errors produced by jv operations.
#[derive(Error, Debug)]
pub enum JvError {
    /// A network request could not be completed.
    #[error("Request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    /// The byte count written differs from the declared size.
    #[error("Incomplete transfer from {url}: expected {expected} bytes, received {received}")]
    IncompleteTransfer {
        url: String,
        expected: u64,
        received: u64,
    },

    /// An operation ran past its deadline.
    #[error("{operation} timed out after {limit:?}")]
    Timeout { operation: String, limit: Duration },

    /// Release metadata is missing something the update needs.
    #[error("Invalid release metadata: {reason}")]
    ReleaseMetadata { reason: String },

    /// The computed digest does not match the published one.
    #[error("Checksum mismatch for '{file}': expected {expected}, got {actual}")]
    ChecksumMismatch {
        file: String,
        expected: String,
        actual: String,
    },

    /// The publisher used a checksum algorithm jv cannot compute.
    #[error("Unsupported checksum algorithm: {algorithm}")]
    UnsupportedChecksum { algorithm: String },

    /// The archive is corrupt, of an unknown kind, or contains unsafe entries.
    #[error("Invalid archive '{path}': {reason}")]
    InvalidArchive { path: PathBuf, reason: String },

    /// The extracted payload is not a usable JDK.
    #[error("Invalid package structure: {reason}")]
    InvalidPackageStructure { reason: String },

    /// The operation requires elevation.
    #[error("Administrator privileges are required to {operation}")]
    PrivilegeRequired { operation: String },

    /// Reading or writing the environment store failed.
    #[error("Failed to {operation} in {store}: {reason}")]
    Store {
        operation: String,
        store: String,
        reason: String,
    },

    /// The configuration file could not be read, parsed or written.
    #[error("Configuration error in {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    /// A local filesystem operation failed.
    #[error("Failed to {operation} '{}': {source}", path.display())]
    FileSystem {
        operation: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Renaming the staged payload onto its final path failed.
    #[error("Failed to move '{}' into '{}': {reason}", staged.display(), target.display())]
    PromotionFailed {
        staged: PathBuf,
        target: PathBuf,
        reason: String,
    },

    /// A requested version, installation or path is unknown.
    #[error("{what} not found")]
    NotFound { what: String },

    /// The distributor identifier is not registered.
    #[error("Unknown distributor '{id}' (available: {available})")]
    UnknownDistributor { id: String, available: String },

    /// The running platform has no mapping in a distributor catalog.
    #[error("Unsupported platform {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    /// Input rejected before any state was touched.
    #[error("{message}")]
    InvalidInput { message: String },

    /// Replacing the executable failed and the backup was restored.
    #[error("update rolled back, original executable restored ({reason})")]
    RolledBack { reason: String },

    /// A package install failed during `phase`.
    #[error("Install failed during {phase}: {source}")]
    Install {
        phase: InstallPhase,
        #[source]
        source: Box<JvError>,
    },

    /// A self-update failed during `phase`.
    #[error("Self-update failed during {phase}: {source}")]
    Update {
        phase: UpdatePhase,
        #[source]
        source: Box<JvError>,
    },

    /// Replacing the executable failed and so did restoring the backup.
    #[error(
        "Self-update failed and the original executable could not be restored: {update_error}; restore failed: {rollback_error}"
    )]
    Unrecoverable {
        update_error: String,
        rollback_error: String,
        backup_path: PathBuf,
    },
}

impl JvError {
    /// Failure class of this error, looking through phase wrappers.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Transport { .. }
            | Self::IncompleteTransfer { .. }
            | Self::Timeout { .. } => ErrorClass::Transport,
            Self::ChecksumMismatch { .. } | Self::UnsupportedChecksum { .. } => {
                ErrorClass::Integrity
            }
            Self::InvalidArchive { .. }
            | Self::InvalidPackageStructure { .. }
            | Self::ReleaseMetadata { .. } => ErrorClass::Structure,
            Self::PrivilegeRequired { .. } => ErrorClass::Privilege,
            Self::Store { .. }
            | Self::Config { .. }
            | Self::FileSystem { .. }
            | Self::PromotionFailed { .. }
            | Self::RolledBack { .. } => ErrorClass::Persistence,
            Self::Unrecoverable { .. } => ErrorClass::Unrecoverable,
            Self::NotFound { .. }
            | Self::UnknownDistributor { .. }
            | Self::UnsupportedPlatform { .. }
            | Self::InvalidInput { .. } => ErrorClass::Other,
            Self::Install { source, .. } | Self::Update { source, .. } => source.class(),
        }
    }

    /// Whether repeating the same operation may succeed without user action.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        self.class() == ErrorClass::Transport
    }

    /// The innermost error below any phase wrappers.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::Install { source, .. } | Self::Update { source, .. } => source.root(),
            other => other,
        }
    }

    /// Wrap this error with the install phase it happened in.
    #[must_use]
    pub fn in_install_phase(self, phase: InstallPhase) -> Self {
        Self::Install {
            phase,
            source: Box::new(self),
        }
    }

    /// Wrap this error with the update phase it happened in.
    #[must_use]
    pub fn in_update_phase(self, phase: UpdatePhase) -> Self {
        Self::Update {
            phase,
            source: Box::new(self),
        }
    }

    /// Build a [`JvError::FileSystem`], mapping permission errors to
    /// [`JvError::PrivilegeRequired`].
    pub fn io(operation: impl Into<String>, path: impl Into<PathBuf>, source: io::Error) -> Self {
        let operation = operation.into();
        let path = path.into();
        if source.kind() == io::ErrorKind::PermissionDenied {
            return Self::PrivilegeRequired {
                operation: format!("{operation} '{}'", path.display()),
            };
        }
        Self::FileSystem {
            operation,
            path,
            source,
        }
    }

    /// Build a [`JvError::Transport`] from a reqwest error.
    pub fn transport(url: impl Into<String>, source: &reqwest::Error) -> Self {
        let reason = if source.is_timeout() {
            "request timed out".to_string()
        } else if source.is_connect() {
            format!("connection failed: {source}")
        } else if let Some(status) = source.status() {
            format!("HTTP {status}")
        } else {
            source.to_string()
        };
        Self::Transport {
            url: url.into(),
            reason,
        }
    }
}

/// An error with an optional suggestion and details for display.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error.
    pub error: JvError,
    /// What the user can do about it.
    pub suggestion: Option<String>,
    /// Extra background on the failure.
    pub details: Option<String>,
}

impl ErrorContext {
    #[must_use]
    pub const fn new(error: JvError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with a suggestion where one is known.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    match error.downcast::<JvError>() {
        Ok(jv_error) => create_error_context(jv_error),
        Err(error) => {
            let permission_denied = error
                .downcast_ref::<io::Error>()
                .is_some_and(|e| e.kind() == io::ErrorKind::PermissionDenied);
            if permission_denied {
                return ErrorContext::new(JvError::PrivilegeRequired {
                    operation: "access a protected file".to_string(),
                })
                .with_suggestion("Re-run from an elevated shell (Administrator or sudo)");
            }
            ErrorContext::new(JvError::InvalidInput {
                message: format!("{error:#}"),
            })
        }
    }
}

fn create_error_context(error: JvError) -> ErrorContext {
    let suggestion = match error.root() {
        JvError::Unrecoverable { backup_path, .. } => Some(format!(
            "Restore manually by copying '{}' over the jv executable",
            backup_path.display()
        )),
        JvError::PrivilegeRequired { .. } => Some(
            "Re-run from an elevated shell (Administrator on Windows, sudo elsewhere), or install with user scope"
                .to_string(),
        ),
        JvError::ChecksumMismatch { .. } => Some(
            "The download was corrupted or tampered with. Nothing was installed; try again later"
                .to_string(),
        ),
        JvError::UnknownDistributor { .. } => {
            Some("Run 'jv available' to see the supported distributors".to_string())
        }
        JvError::NotFound { .. } => {
            Some("Run 'jv list' to see installed versions or 'jv available' for downloads".to_string())
        }
        JvError::Config { path, .. } => Some(format!(
            "Fix or remove '{}'; jv recreates it with defaults",
            path.display()
        )),
        _ if error.is_retriable() => {
            Some("Check your network connection and try again".to_string())
        }
        _ => None,
    };

    let details = match error.root() {
        JvError::Unrecoverable { .. } => Some(
            "The executable may be missing or corrupt until the backup is restored".to_string(),
        ),
        JvError::RolledBack { .. } => Some("Your installed version was not changed".to_string()),
        JvError::PromotionFailed { .. } => Some(
            "Any previous installation at the target path was already removed".to_string(),
        ),
        _ => None,
    };

    let mut context = ErrorContext::new(error);
    if let Some(suggestion) = suggestion {
        context = context.with_suggestion(suggestion);
    }
    if let Some(details) = details {
        context = context.with_details(details);
    }
    context
}
