//! Shared helpers for CLI commands.

use super::CliConfig;
use crate::config::Config;
use crate::core::JvError;
use crate::discovery::{Detector, JavaInstallation, resolve};
use crate::env::{EnvironmentManager, NativeStore, native_store};
use crate::utils::platform::locate_java_home;
use anyhow::Result;
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Configuration loaded for one command.
pub struct CommandContext {
    pub config: Config,
    pub show_progress: bool,
}

impl CommandContext {
    pub fn load(cli: &CliConfig) -> Result<Self> {
        let config = Config::load(cli.config_path.as_deref())?;
        Ok(Self {
            config,
            show_progress: !cli.no_progress,
        })
    }

    pub fn config_path(&self) -> &Path {
        self.config.path()
    }

    /// Every JDK known from the machine and the configuration.
    #[must_use]
    pub fn installations(&self) -> Vec<JavaInstallation> {
        Detector::new().find_all(&self.config)
    }
}

/// The environment store for this machine.
pub fn environment() -> Result<EnvironmentManager<NativeStore>> {
    Ok(EnvironmentManager::new(native_store()?))
}

/// Resolve a `use`/`uninstall` argument: a known version, a known path, or
/// any directory that holds a JDK.
pub fn resolve_target(installs: &[JavaInstallation], target: &str) -> Result<PathBuf, JvError> {
    if let Some(found) = resolve(installs, target) {
        return Ok(found.path.clone());
    }
    let path = Path::new(target.trim());
    if path.is_dir() {
        if let Some(home) = locate_java_home(path) {
            return Ok(home);
        }
        return Err(JvError::InvalidInput {
            message: format!("'{}' does not contain a JDK (no bin/java)", path.display()),
        });
    }
    Err(JvError::NotFound {
        what: format!("Java '{}'", target.trim()),
    })
}

pub fn print_success(message: &str) {
    println!("{} {message}", "✓".green());
}

pub fn print_warning(message: &str) {
    eprintln!("{} {message}", "!".yellow());
}
