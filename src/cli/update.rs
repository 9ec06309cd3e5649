use super::CliConfig;
use super::common::{CommandContext, print_success};
use crate::download::{Downloader, http_client};
use crate::upgrade::{GitHubReleaseSource, ReleaseInfo, SelfUpdater, UpdateCheck, VersionChecker};
use crate::utils::progress::ProgressBar;
use anyhow::Result;
use chrono::Utc;
use clap::Args;
use colored::Colorize;
use std::sync::Arc;
use tracing::debug;

#[derive(Args, Debug)]
pub struct UpdateCommand {
    /// Only report whether an update is available.
    #[arg(long, conflicts_with_all = ["skip", "rollback"])]
    pub check: bool,

    /// Stop announcing the latest release.
    #[arg(long, conflicts_with = "rollback")]
    pub skip: bool,

    /// Restore the executable saved by the last update.
    #[arg(long)]
    pub rollback: bool,
}

impl UpdateCommand {
    pub async fn execute(self, cli: &CliConfig) -> Result<()> {
        let client = http_client()?;
        let executable = SelfUpdater::current_executable()?;
        let updater = SelfUpdater::new(Downloader::new(client.clone()), executable);

        if self.rollback {
            println!("{}", "Rolling back to the previous version...".yellow());
            let restored = updater.rollback().await?;
            print_success(&format!("Restored {}", restored.display()));
            return Ok(());
        }

        let mut ctx = CommandContext::load(cli)?;
        let checker = VersionChecker::new(
            env!("CARGO_PKG_VERSION"),
            Arc::new(GitHubReleaseSource::new(client)),
        );

        if self.skip {
            let release = checker.latest().await?;
            ctx.config.update_config.skip_version = Some(release.version.clone());
            ctx.config.save()?;
            print_success(&format!(
                "Version {} will not be announced again",
                release.version
            ));
            return Ok(());
        }

        println!("{}", "Checking for updates...".cyan());
        let check = checker.check(&mut ctx.config.update_config, Utc::now()).await?;
        if let Err(e) = ctx.config.save() {
            debug!("Could not record update check: {e}");
        }

        let release = match &check {
            UpdateCheck::Disabled => {
                println!(
                    "Updates are disabled (update_config.enabled in {})",
                    ctx.config_path().display()
                );
                return Ok(());
            }
            UpdateCheck::UpToDate { latest } => {
                print_success(&format!(
                    "You are on the latest version ({})",
                    checker.current_version()
                ));
                debug!("Latest published release is {latest}");
                return Ok(());
            }
            UpdateCheck::Skipped(release) | UpdateCheck::Available(release) => release.clone(),
        };

        let skipped = matches!(check, UpdateCheck::Skipped(_));
        let line = availability_line(&check, checker.current_version());
        if skipped {
            println!("{}", line.yellow());
        } else {
            println!("{}", line.green());
        }
        if self.check {
            let hint = if skipped { " anyway" } else { "" };
            println!("Run `jv update` to install it{hint}");
            return Ok(());
        }

        install(updater, &release, !cli.no_progress).await?;

        if ctx.config.update_config.skipped_version().is_some() {
            ctx.config.update_config.skip_version = None;
            if let Err(e) = ctx.config.save() {
                debug!("Could not clear the skipped version: {e}");
            }
        }
        Ok(())
    }
}

/// One line describing a newer release; a skipped release is never reported
/// as available.
fn availability_line(check: &UpdateCheck, current: &str) -> String {
    match check {
        UpdateCheck::Skipped(release) => {
            format!("Version {} is skipped (current {current})", release.version)
        }
        UpdateCheck::Available(release) => {
            format!("Update available: {current} -> {}", release.version)
        }
        UpdateCheck::Disabled | UpdateCheck::UpToDate { .. } => String::new(),
    }
}

async fn install(
    updater: SelfUpdater,
    release: &ReleaseInfo,
    show_progress: bool,
) -> Result<()> {
    let bar = ProgressBar::new_download(show_progress);
    bar.set_prefix(format!("jv {}", release.version));
    let updater = updater.on_progress(bar.download_callback());
    let result = updater.perform_update(release).await;
    bar.finish_and_clear();

    let outcome = result?;
    print_success(&format!(
        "Updated {} to {}",
        outcome.executable.display(),
        outcome.version
    ));
    if let Err(e) = outcome.cleanup.await {
        debug!("Backup cleanup task failed: {e}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributor::DownloadInfo;
    use crate::verification::ChecksumAlgorithm;

    fn release(version: &str) -> ReleaseInfo {
        ReleaseInfo {
            version: version.to_string(),
            download: DownloadInfo::new("u", 1, "ab", ChecksumAlgorithm::Sha256, "jv").unwrap(),
        }
    }

    #[test]
    fn test_skipped_release_is_not_reported_as_available() {
        let skipped = availability_line(&UpdateCheck::Skipped(release("0.6.0")), "0.5.2");
        assert_eq!(skipped, "Version 0.6.0 is skipped (current 0.5.2)");
        assert!(!skipped.contains("available"));

        let available = availability_line(&UpdateCheck::Available(release("0.6.0")), "0.5.2");
        assert_eq!(available, "Update available: 0.5.2 -> 0.6.0");
    }
}
