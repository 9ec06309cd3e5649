//! Shared helpers for the integration suite.

#![allow(dead_code)]

use assert_cmd::Command;
use jv_cli::config::Config;
use jv_cli::utils::platform::java_executable_name;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// An isolated home and configuration directory for running the `jv` binary.
pub struct TestEnv {
    pub temp: TempDir,
    pub home: PathBuf,
    pub config_path: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let home = temp.path().join("home");
        fs::create_dir_all(&home).unwrap();
        let config_path = temp.path().join("config").join("jv").join("jv.json");
        Self {
            temp,
            home,
            config_path,
        }
    }

    /// `jv` with every outside input pointed into the temp directory.
    pub fn jv(&self) -> Command {
        let mut cmd = Command::cargo_bin("jv").unwrap();
        cmd.env("HOME", &self.home)
            .env("USERPROFILE", &self.home)
            .env("XDG_CONFIG_HOME", self.temp.path().join("config"))
            .env("JV_CONFIG", &self.config_path)
            .env("JV_NO_UPDATE_CHECK", "1")
            .env("JV_NO_PROGRESS", "1")
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG");
        cmd
    }

    /// A fake JDK under the temp directory.
    pub fn jdk(&self, name: &str, version: Option<&str>) -> PathBuf {
        let path = self.temp.path().join("jdks").join(name);
        fake_jdk(&path, version);
        path
    }

    pub fn config(&self) -> Config {
        Config::load_from(&self.config_path).unwrap()
    }
}

/// `bin/<java launcher>` plus an optional `release` file.
pub fn fake_jdk(path: &Path, version: Option<&str>) {
    fs::create_dir_all(path.join("bin")).unwrap();
    fs::write(path.join("bin").join(java_executable_name()), b"").unwrap();
    if let Some(version) = version {
        fs::write(path.join("release"), format!("JAVA_VERSION=\"{version}\"\n")).unwrap();
    }
}
