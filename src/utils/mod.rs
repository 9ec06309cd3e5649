//! Cross-platform utilities shared by the pipelines and the CLI.
//!
//! - [`fs`] - atomic writes and path comparison
//! - [`platform`] - OS detection, elevation, JDK layout checks
//! - [`progress`] - progress bars that stay quiet when disabled

pub mod fs;
pub mod platform;
pub mod progress;

pub use fs::{atomic_write, ensure_dir, paths_equal};
pub use platform::{get_home_dir, is_elevated, is_valid_java_home, is_windows};
pub use progress::{ProgressBar, ProgressStyle};
