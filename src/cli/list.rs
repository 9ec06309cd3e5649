use super::CliConfig;
use super::common::{CommandContext, environment, print_warning};
use crate::discovery::JdkSource;
use crate::distributor::DistributorRegistry;
use crate::download::http_client;
use crate::utils::fs::paths_equal;
use crate::utils::progress::ProgressBar;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tracing::debug;

#[derive(Args, Debug)]
pub struct ListCommand {}

impl ListCommand {
    pub fn execute(self, cli: &CliConfig) -> Result<()> {
        let ctx = CommandContext::load(cli)?;
        let installs = ctx.installations();
        if installs.is_empty() {
            println!("No JDKs found. Install one with `jv install <version>`.");
            return Ok(());
        }

        let current = environment()
            .and_then(|env| env.get_home().map_err(Into::into))
            .unwrap_or_else(|e| {
                debug!("Could not read JAVA_HOME: {e}");
                None
            });

        let width = installs.iter().map(|i| i.version.len()).max().unwrap_or(0);
        for install in &installs {
            let active = current
                .as_deref()
                .is_some_and(|home| paths_equal(home, &install.path));
            let marker = if active { "*".green().bold() } else { " ".normal() };
            let source = match install.source {
                JdkSource::Detected => "detected".dimmed(),
                JdkSource::Custom => "custom".cyan(),
                JdkSource::Installed => "installed".green(),
            };
            println!(
                "{marker} {:<width$}  {}  [{source}]",
                install.version,
                install.path.display()
            );
        }
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct AvailableCommand {
    /// Distributor to query (default: the first registered).
    #[arg(long, short)]
    pub distributor: Option<String>,
}

impl AvailableCommand {
    pub async fn execute(self, cli: &CliConfig) -> Result<()> {
        let registry = DistributorRegistry::with_defaults(http_client()?);
        let distributor = registry.get(self.distributor.as_deref())?;

        let spinner = ProgressBar::new_spinner(!cli.no_progress);
        spinner.set_message(format!("Fetching versions from {}", distributor.name()));
        let listing = distributor.available_versions().await;
        spinner.finish_and_clear();

        if let Some(reason) = &listing.degraded {
            print_warning(&format!(
                "Could not reach {} ({reason}); showing the built-in list",
                distributor.name()
            ));
        }

        println!("{} ({}):", distributor.name().bold(), distributor.id());
        for release in &listing.releases {
            if release.is_lts {
                println!("  {:<4} {}", release.version, "LTS".green());
            } else {
                println!("  {}", release.version);
            }
        }
        Ok(())
    }
}
