//! Command-line interface for jv.
//!
//! Each command lives in its own module with a clap argument struct and an
//! `execute` method. Commands never prompt; everything is argument driven so
//! jv can run from scripts and provisioning tools.
//!
//! # Commands
//!
//! ## Switching
//! - `use <version|path>` - point `JAVA_HOME` at a JDK and rewrite the search path
//! - `current` - show the active JDK
//!
//! ## Inventory
//! - `list` - JDKs found on this machine
//! - `available` - versions offered by a distributor
//! - `install <version>...` - download, verify and install JDKs
//! - `uninstall <version|path>` - remove a JDK installed by jv
//! - `add` / `remove` - register individual JDK roots
//! - `add-path` / `remove-path` / `paths` - directories scanned for JDKs
//!
//! ## Maintenance
//! - `doctor` / `repair` - diagnose and fix the environment
//! - `update` - check for, install, skip or roll back jv updates
//!
//! # Global Options
//!
//! - `--verbose` - debug logging on stderr
//! - `--quiet` - errors only
//! - `--no-progress` - hide progress bars
//! - `--config` - path to `jv.json`
//!
//! ```bash
//! jv install 21 17
//! jv use 21
//! jv --verbose doctor
//! ```

pub mod common;
mod doctor;
mod install;
mod list;
mod paths;
mod switch;
mod update;


use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Runtime settings derived from the global flags.
///
/// Passed to every command instead of being exported as environment
/// variables, so tests can run commands with their own settings.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Default log filter when `RUST_LOG` is not set.
    pub log_level: Option<String>,

    /// Hide progress bars and spinners.
    pub no_progress: bool,

    /// Explicit configuration file; `JV_CONFIG` and the default location
    /// are consulted when `None`.
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the global tracing subscriber. Logs go to stderr; `RUST_LOG`
    /// overrides the level chosen by the flags.
    pub fn init_logging(&self) {
        let level = self.log_level.as_deref().unwrap_or("warn");
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

#[derive(Parser)]
#[command(
    name = "jv",
    about = "Java version switcher - select, install and manage JDKs",
    version,
    author,
    long_about = "jv sets JAVA_HOME and the search path, installs verified JDK packages from distributor catalogs, and keeps itself up to date."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the configuration file (default: ~/.config/jv/jv.json).
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Disable progress bars and spinners.
    #[arg(long, global = true)]
    no_progress: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Switch to a JDK by version or path.
    Use(switch::UseCommand),

    /// Show the active JDK.
    Current(switch::CurrentCommand),

    /// List JDKs found on this machine.
    List(list::ListCommand),

    /// List versions offered by a distributor.
    Available(list::AvailableCommand),

    /// Install one or more JDKs.
    Install(install::InstallCommand),

    /// Remove a JDK installed by jv.
    Uninstall(install::UninstallCommand),

    /// Register a JDK directory.
    Add(paths::AddCommand),

    /// Unregister a JDK directory.
    Remove(paths::RemoveCommand),

    /// Add a directory scanned for JDKs.
    AddPath(paths::AddPathCommand),

    /// Stop scanning a directory for JDKs.
    RemovePath(paths::RemovePathCommand),

    /// Show registered JDK directories and search directories.
    Paths(paths::PathsCommand),

    /// Diagnose the Java environment.
    Doctor(doctor::DoctorCommand),

    /// Fix what `doctor` reports as repairable.
    Repair(doctor::RepairCommand),

    /// Check for and install jv updates.
    Update(update::UpdateCommand),
}

impl Cli {
    /// Run with settings built from the parsed flags.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        };

        CliConfig {
            log_level: Some(log_level.to_string()),
            no_progress: self.no_progress,
            config_path: self.config.clone(),
        }
    }

    /// Whether the background update check should be skipped for this run.
    #[must_use]
    pub const fn is_update_command(&self) -> bool {
        matches!(self.command, Commands::Update(_))
    }

    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        match self.command {
            Commands::Use(cmd) => cmd.execute(&config),
            Commands::Current(cmd) => cmd.execute(&config),
            Commands::List(cmd) => cmd.execute(&config),
            Commands::Available(cmd) => cmd.execute(&config).await,
            Commands::Install(cmd) => cmd.execute(&config).await,
            Commands::Uninstall(cmd) => cmd.execute(&config),
            Commands::Add(cmd) => cmd.execute(&config),
            Commands::Remove(cmd) => cmd.execute(&config),
            Commands::AddPath(cmd) => cmd.execute(&config),
            Commands::RemovePath(cmd) => cmd.execute(&config),
            Commands::Paths(cmd) => cmd.execute(&config),
            Commands::Doctor(cmd) => cmd.execute(&config),
            Commands::Repair(cmd) => cmd.execute(&config).await,
            Commands::Update(cmd) => cmd.execute(&config).await,
        }
    }
}
