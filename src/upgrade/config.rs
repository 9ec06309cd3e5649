use crate::constants::DEFAULT_CHECK_INTERVAL_SECS;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Self-update settings stored under `update_config` in `jv.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateConfig {
    /// Master switch; when false jv never contacts the release server.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Run the rate-limited background check on every command.
    #[serde(default = "default_auto_check")]
    pub auto_check: bool,

    /// When the last check completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_check: Option<DateTime<Utc>>,

    /// A release the user chose to skip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_version: Option<String>,

    /// Minimum seconds between background checks.
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            auto_check: default_auto_check(),
            last_check: None,
            skip_version: None,
            check_interval_secs: default_check_interval(),
        }
    }
}

const fn default_enabled() -> bool {
    true
}

const fn default_auto_check() -> bool {
    true
}

const fn default_check_interval() -> u64 {
    DEFAULT_CHECK_INTERVAL_SECS
}

impl UpdateConfig {
    /// The skipped version, ignoring blank markers.
    #[must_use]
    pub fn skipped_version(&self) -> Option<&str> {
        self.skip_version
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    /// Whether a background check is due at `now`.
    #[must_use]
    pub fn should_check(&self, now: DateTime<Utc>) -> bool {
        if !self.enabled || !self.auto_check {
            return false;
        }
        match self.last_check {
            None => true,
            Some(last) => {
                let elapsed = now.signed_duration_since(last).num_seconds();
                elapsed < 0 || elapsed as u64 >= self.check_interval_secs
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_defaults_from_empty_json() {
        let config: UpdateConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, UpdateConfig::default());
        assert!(config.enabled);
        assert!(config.auto_check);
        assert_eq!(config.check_interval_secs, 86400);
    }

    #[test]
    fn test_should_check_interval() {
        let now = Utc::now();
        let mut config = UpdateConfig::default();
        assert!(config.should_check(now));

        config.last_check = Some(now - Duration::hours(1));
        assert!(!config.should_check(now));

        config.last_check = Some(now - Duration::hours(25));
        assert!(config.should_check(now));

        config.auto_check = false;
        assert!(!config.should_check(now));
    }

    #[test]
    fn test_blank_skip_marker_is_ignored() {
        let config: UpdateConfig =
            serde_json::from_str(r#"{"enabled":true,"skip_version":"  "}"#).unwrap();
        assert_eq!(config.skipped_version(), None);
    }
}
