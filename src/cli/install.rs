use super::CliConfig;
use super::common::{CommandContext, environment, print_success, print_warning};
use crate::config::InstallScope;
use crate::core::{InstallPhase, JvError};
use crate::discovery::{JdkSource, resolve};
use crate::distributor::{DistributorRegistry, Platform};
use crate::download::{Downloader, http_client};
use crate::installer::{InstallLayout, InstallRequest, PackageInstaller, uninstall};
use crate::utils::fs::paths_equal;
use crate::utils::progress::ProgressBar;
use anyhow::{Result, bail};
use clap::Args;
use colored::Colorize;
use std::sync::Arc;
use tracing::debug;

#[derive(Args, Debug)]
pub struct InstallCommand {
    /// Feature versions to install, e.g. `21 17`.
    #[arg(required = true, value_name = "VERSION")]
    pub versions: Vec<String>,

    /// Distributor to download from (default: the first registered).
    #[arg(long, short)]
    pub distributor: Option<String>,

    /// Install machine-wide (requires Administrator/root).
    #[arg(long)]
    pub system: bool,
}

impl InstallCommand {
    pub async fn execute(self, cli: &CliConfig) -> Result<()> {
        let mut ctx = CommandContext::load(cli)?;
        let client = http_client()?;
        let registry = DistributorRegistry::with_defaults(client.clone());
        let distributor = registry.get(self.distributor.as_deref())?;
        let layout = InstallLayout::from_environment()?;
        let scope = if self.system {
            InstallScope::System
        } else {
            InstallScope::User
        };

        let mut installed = Vec::new();
        let mut failures: Vec<(String, JvError)> = Vec::new();

        for version in &self.versions {
            let bar = ProgressBar::new_download(ctx.show_progress);
            bar.set_prefix(format!("Java {version}"));
            let phase_bar = bar.clone();
            let installer = PackageInstaller::new(Downloader::new(client.clone()), layout.clone())
                .on_progress(bar.download_callback())
                .on_phase(Arc::new(move |phase: InstallPhase| {
                    phase_bar.set_message(phase.to_string());
                }));

            let request = InstallRequest::new(distributor, version, scope, Platform::current());
            let result = installer.install_and_record(&request, &mut ctx.config).await;
            bar.finish_and_clear();

            match result {
                Ok(outcome) => {
                    let action = if outcome.replaced_existing {
                        "Reinstalled"
                    } else {
                        "Installed"
                    };
                    let release = outcome
                        .release_name
                        .as_deref()
                        .map(|name| format!(" ({name})"))
                        .unwrap_or_default();
                    print_success(&format!(
                        "{action} {} Java {}{release} to {}",
                        distributor.name(),
                        outcome.record.version.bold(),
                        outcome.record.path.display()
                    ));
                    installed.push(outcome.record);
                }
                Err(e) => {
                    eprintln!("{} Java {version}: {e}", "✗".red());
                    failures.push((version.clone(), e));
                }
            }
        }

        if let Some(first) = installed.first() {
            activate_if_unset(&first.path, &first.version);
        }

        match (installed.len(), failures.len()) {
            (_, 0) => Ok(()),
            (0, 1) => {
                let (_, error) = failures.remove(0);
                Err(error.into())
            }
            (_, failed) => {
                let names: Vec<&str> = failures.iter().map(|(v, _)| v.as_str()).collect();
                bail!(
                    "{failed} of {} installs failed: {}",
                    self.versions.len(),
                    names.join(", ")
                )
            }
        }
    }
}

/// Point `JAVA_HOME` at a fresh install when nothing is active yet.
fn activate_if_unset(home: &std::path::Path, version: &str) {
    let env = match environment() {
        Ok(env) => env,
        Err(e) => {
            debug!("Environment store unavailable: {e}");
            return;
        }
    };
    match env.get_home() {
        Ok(None) => {}
        Ok(Some(_)) => return,
        Err(e) => {
            debug!("Could not read JAVA_HOME: {e}");
            return;
        }
    }

    match env.set_home(home) {
        Ok(()) => print_success(&format!("JAVA_HOME set to Java {version}")),
        Err(JvError::PrivilegeRequired { .. }) => print_warning(&format!(
            "JAVA_HOME is not set; run `jv use {version}` from an elevated shell"
        )),
        Err(e) => print_warning(&format!("Could not set JAVA_HOME: {e}")),
    }
}

#[derive(Args, Debug)]
pub struct UninstallCommand {
    /// Version or path of a JDK installed by jv.
    #[arg(value_name = "VERSION|PATH")]
    pub target: String,
}

impl UninstallCommand {
    pub fn execute(self, cli: &CliConfig) -> Result<()> {
        let mut ctx = CommandContext::load(cli)?;
        let installed: Vec<_> = ctx
            .installations()
            .into_iter()
            .filter(|i| i.source == JdkSource::Installed)
            .collect();

        let path = match resolve(&installed, &self.target) {
            Some(install) => install.path.clone(),
            None => ctx
                .config
                .installed_jdks
                .iter()
                .find(|r| {
                    r.matches_version(&self.target)
                        || paths_equal(&r.path, std::path::Path::new(self.target.trim()))
                })
                .map(|r| r.path.clone())
                .ok_or_else(|| JvError::NotFound {
                    what: format!("Installed Java '{}'", self.target.trim()),
                })?,
        };

        if let Ok(Some(home)) = environment().and_then(|env| env.get_home().map_err(Into::into)) {
            if paths_equal(&home, &path) {
                bail!(
                    "Java at {} is the current JAVA_HOME; switch to another version with `jv use` first",
                    path.display()
                );
            }
        }

        let record = uninstall(&mut ctx.config, &path)?;
        print_success(&format!(
            "Uninstalled Java {} from {}",
            record.version,
            record.path.display()
        ));
        Ok(())
    }
}
