//! Progress indicators
//!
//! Thin wrapper over indicatif used for downloads and long-running steps. Bars
//! are hidden when `JV_NO_PROGRESS` is set or `--no-progress` is passed, so
//! scripted runs get clean output.
//!
//! ```rust,no_run
//! use jv_cli::utils::progress::ProgressBar;
//!
//! let bar = ProgressBar::new_download(true);
//! let callback = bar.download_callback();
//! // pass `callback` to a download ...
//! bar.finish_with_message("downloaded");
//! ```

use crate::constants::NO_PROGRESS_ENV;
use crate::download::{DownloadProgress, ProgressCallback};
use indicatif::{ProgressBar as IndicatifBar, ProgressStyle as IndicatifStyle};
use std::sync::Arc;
use std::time::Duration;

fn is_progress_disabled() -> bool {
    std::env::var_os(NO_PROGRESS_ENV).is_some()
}

#[derive(Clone)]
pub struct ProgressBar {
    inner: IndicatifBar,
}

impl ProgressBar {
    /// A byte-count bar for a download whose size becomes known later.
    pub fn new_download(enabled: bool) -> Self {
        let bar = if !enabled || is_progress_disabled() {
            IndicatifBar::hidden()
        } else {
            let bar = IndicatifBar::new(0);
            bar.set_style(ProgressStyle::download());
            bar
        };
        Self { inner: bar }
    }

    pub fn new_spinner(enabled: bool) -> Self {
        let bar = if !enabled || is_progress_disabled() {
            IndicatifBar::hidden()
        } else {
            let bar = IndicatifBar::new_spinner();
            bar.set_style(ProgressStyle::spinner());
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        };
        Self { inner: bar }
    }

    pub fn set_message(&self, msg: impl Into<String>) {
        self.inner.set_message(msg.into());
    }

    pub fn set_prefix(&self, prefix: impl Into<String>) {
        self.inner.set_prefix(prefix.into());
    }

    pub fn set_length(&self, len: u64) {
        self.inner.set_length(len);
    }

    pub fn set_position(&self, pos: u64) {
        self.inner.set_position(pos);
    }

    pub fn finish_with_message(&self, msg: impl Into<String>) {
        self.inner.finish_with_message(msg.into());
    }

    pub fn finish_and_clear(&self) {
        self.inner.finish_and_clear();
    }

    /// A download callback that drives this bar.
    pub fn download_callback(&self) -> ProgressCallback {
        let bar = self.inner.clone();
        Arc::new(move |progress: DownloadProgress| {
            if let Some(total) = progress.total {
                if bar.length() != Some(total) {
                    bar.set_length(total);
                }
            }
            bar.set_position(progress.downloaded);
        })
    }
}

pub struct ProgressStyle;

impl ProgressStyle {
    pub fn spinner() -> IndicatifStyle {
        IndicatifStyle::default_spinner()
            .template("{prefix:.bold} {spinner:.cyan} {msg}")
            .unwrap_or_else(|_| IndicatifStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
    }

    pub fn download() -> IndicatifStyle {
        IndicatifStyle::default_bar()
            .template("{prefix:.bold.cyan} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            .unwrap_or_else(|_| IndicatifStyle::default_bar())
            .progress_chars("━╸━")
    }
}
