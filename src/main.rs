//! jv CLI entry point
//!
//! Parses arguments, sets up logging, runs the command and prints errors with
//! suggestions. Every command except `update` starts the rate-limited
//! background update check next to it and prints a one-line notice on stderr
//! if the check finishes in time.

use anyhow::Result;
use clap::Parser;
use jv_cli::cli::{self, CliConfig};
use jv_cli::config::Config;
use jv_cli::constants::{BACKGROUND_NOTICE_WAIT, NO_UPDATE_CHECK_ENV};
use jv_cli::core::error::user_friendly_error;
use jv_cli::download::http_client;
use jv_cli::upgrade::{BackgroundCheck, GitHubReleaseSource, VersionChecker, record_check};
use std::sync::Arc;
use tracing::debug;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let config = cli.build_config();
    config.init_logging();

    let background = if cli.is_update_command() {
        None
    } else {
        start_background_check(&config)
    };

    let result = cli.execute_with_config(config.clone()).await;

    if let Some(background) = background {
        if let Some(report) = background.finish(BACKGROUND_NOTICE_WAIT).await {
            if let Ok(path) = Config::resolve_path(config.config_path.as_deref()) {
                record_check(&path, &report);
            }
            if let Some(notice) = report.notice(env!("CARGO_PKG_VERSION")) {
                eprintln!("{notice}");
            }
        }
    }

    match result {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}

fn start_background_check(config: &CliConfig) -> Option<BackgroundCheck> {
    if std::env::var_os(NO_UPDATE_CHECK_ENV).is_some() {
        return None;
    }
    let update_config = match Config::load(config.config_path.as_deref()) {
        Ok(loaded) => loaded.update_config,
        Err(e) => {
            debug!("Skipping background update check: {e}");
            return None;
        }
    };
    let client = match http_client() {
        Ok(client) => client,
        Err(e) => {
            debug!("Skipping background update check: {e}");
            return None;
        }
    };
    let checker = VersionChecker::new(
        env!("CARGO_PKG_VERSION"),
        Arc::new(GitHubReleaseSource::new(client)),
    );
    BackgroundCheck::spawn(checker, &update_config)
}
