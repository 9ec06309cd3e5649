use super::CliConfig;
use super::common::{CommandContext, print_success};
use crate::core::JvError;
use crate::discovery::version_of;
use crate::utils::platform::locate_java_home;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct AddCommand {
    /// JDK root directory.
    pub path: PathBuf,
}

impl AddCommand {
    pub fn execute(self, cli: &CliConfig) -> Result<()> {
        let mut ctx = CommandContext::load(cli)?;
        let home = locate_java_home(&self.path).ok_or_else(|| JvError::InvalidInput {
            message: format!("'{}' does not contain a JDK (no bin/java)", self.path.display()),
        })?;

        if !ctx.config.add_custom_path(&home) {
            println!("{} is already registered", home.display());
            return Ok(());
        }
        ctx.config.save()?;
        print_success(&format!("Added Java {} at {}", version_of(&home), home.display()));
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct RemoveCommand {
    /// A directory registered with `jv add`.
    pub path: PathBuf,
}

impl RemoveCommand {
    pub fn execute(self, cli: &CliConfig) -> Result<()> {
        let mut ctx = CommandContext::load(cli)?;
        if !ctx.config.remove_custom_path(&self.path) {
            return Err(JvError::NotFound {
                what: format!("Registered path '{}'", self.path.display()),
            }
            .into());
        }
        ctx.config.save()?;
        print_success(&format!("Removed {}", self.path.display()));
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct AddPathCommand {
    /// Directory whose subdirectories are JDK roots.
    pub dir: PathBuf,
}

impl AddPathCommand {
    pub fn execute(self, cli: &CliConfig) -> Result<()> {
        if !self.dir.is_dir() {
            return Err(JvError::InvalidInput {
                message: format!("'{}' is not a directory", self.dir.display()),
            }
            .into());
        }
        let mut ctx = CommandContext::load(cli)?;
        if !ctx.config.add_search_path(&self.dir) {
            println!("{} is already a search directory", self.dir.display());
            return Ok(());
        }
        ctx.config.save()?;
        print_success(&format!("Searching {} for JDKs", self.dir.display()));
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct RemovePathCommand {
    pub dir: PathBuf,
}

impl RemovePathCommand {
    pub fn execute(self, cli: &CliConfig) -> Result<()> {
        let mut ctx = CommandContext::load(cli)?;
        if !ctx.config.remove_search_path(&self.dir) {
            return Err(JvError::NotFound {
                what: format!("Search directory '{}'", self.dir.display()),
            }
            .into());
        }
        ctx.config.save()?;
        print_success(&format!("No longer searching {}", self.dir.display()));
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct PathsCommand {}

impl PathsCommand {
    pub fn execute(self, cli: &CliConfig) -> Result<()> {
        let ctx = CommandContext::load(cli)?;
        println!("{} {}", "Configuration:".bold(), ctx.config_path().display());

        println!("{}", "Registered JDKs:".bold());
        if ctx.config.custom_paths.is_empty() {
            println!("  (none)");
        }
        for path in &ctx.config.custom_paths {
            let missing = if path.is_dir() { "" } else { " (missing)" };
            println!("  {}{}", path.display(), missing.red());
        }

        println!("{}", "Search directories:".bold());
        if ctx.config.search_paths.is_empty() {
            println!("  (none)");
        }
        for dir in &ctx.config.search_paths {
            println!("  {}", dir.display());
        }
        Ok(())
    }
}
