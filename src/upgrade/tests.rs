use super::*;
use crate::core::{ErrorClass, JvError, UpdatePhase};
use crate::distributor::{DownloadInfo, Platform};
use crate::download::{Downloader, http_client};
use crate::test_utils::{init_test_logging, sha256_hex};
use crate::verification::ChecksumAlgorithm;
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const NEW_BINARY: &[u8] = b"#!/bin/sh\necho jv 9.9.9\n";
const OLD_BINARY: &[u8] = b"#!/bin/sh\necho jv 0.1.0\n";

/// Release source returning a fixed release after an optional delay.
struct FakeSource {
    release: Option<ReleaseInfo>,
    delay: Duration,
    calls: AtomicUsize,
}

impl FakeSource {
    fn new(release: Option<ReleaseInfo>) -> Self {
        Self {
            release,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl ReleaseSource for FakeSource {
    async fn latest(&self, _platform: &Platform) -> Result<ReleaseInfo, JvError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.release.clone().ok_or_else(|| JvError::Transport {
            url: "fake".to_string(),
            reason: "offline".to_string(),
        })
    }
}

fn release(version: &str, url: &str, checksum: &str) -> ReleaseInfo {
    ReleaseInfo {
        version: version.to_string(),
        download: DownloadInfo::new(
            url,
            NEW_BINARY.len() as u64,
            checksum,
            ChecksumAlgorithm::Sha256,
            "jv-linux-x86_64",
        )
        .unwrap(),
    }
}

struct UpdateHarness {
    server: MockServer,
    temp: TempDir,
    exe: PathBuf,
}

impl UpdateHarness {
    async fn new() -> Self {
        init_test_logging(None);
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jv-linux-x86_64"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(NEW_BINARY))
            .mount(&server)
            .await;
        let temp = TempDir::new().unwrap();
        let exe = temp.path().join("jv");
        fs::write(&exe, OLD_BINARY).unwrap();
        Self { server, temp, exe }
    }

    fn release(&self, checksum: &str) -> ReleaseInfo {
        release(
            "9.9.9",
            &format!("{}/jv-linux-x86_64", self.server.uri()),
            checksum,
        )
    }

    fn updater(&self) -> SelfUpdater {
        SelfUpdater::new(Downloader::new(http_client().unwrap()), self.exe.clone())
            .cleanup_grace(Duration::from_millis(200))
            .restore_policy(2, Duration::from_millis(10))
    }

    fn leftovers(&self) -> Vec<String> {
        fs::read_dir(self.temp.path())
            .unwrap()
            .filter_map(Result::ok)
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name != "jv")
            .collect()
    }
}

#[tokio::test]
async fn test_update_succeeds_and_cleans_up() {
    let h = UpdateHarness::new().await;
    let outcome = h
        .updater()
        .perform_update(&h.release(&sha256_hex(NEW_BINARY)))
        .await
        .unwrap();

    assert_eq!(outcome.version, "9.9.9");
    assert_eq!(fs::read(&h.exe).unwrap(), NEW_BINARY);
    assert!(outcome.backup_path.exists(), "backup survives the grace period");

    outcome.cleanup.await.unwrap();
    assert!(!outcome.backup_path.exists());
    assert!(h.leftovers().is_empty(), "left behind: {:?}", h.leftovers());
}

#[cfg(unix)]
#[tokio::test]
async fn test_updated_binary_is_executable() {
    use std::os::unix::fs::PermissionsExt;

    let h = UpdateHarness::new().await;
    h.updater()
        .perform_update(&h.release(&sha256_hex(NEW_BINARY)))
        .await
        .unwrap();
    let mode = fs::metadata(&h.exe).unwrap().permissions().mode();
    assert_eq!(mode & 0o111, 0o111);
}

#[tokio::test]
async fn test_checksum_mismatch_touches_nothing() {
    let h = UpdateHarness::new().await;
    let err = h
        .updater()
        .perform_update(&h.release(&"0".repeat(64)))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        JvError::Update {
            phase: UpdatePhase::Verify,
            ..
        }
    ));
    assert_eq!(err.class(), ErrorClass::Integrity);
    assert_eq!(fs::read(&h.exe).unwrap(), OLD_BINARY);
    assert!(h.leftovers().is_empty(), "left behind: {:?}", h.leftovers());
}

#[tokio::test]
async fn test_failed_replace_rolls_back() {
    let h = UpdateHarness::new().await;
    let updater = h.updater().with_swap(|_: &Path, target: &Path| -> io::Result<()> {
        fs::write(target, b"half-written")?;
        Err(io::Error::other("disk full"))
    });

    let err = updater
        .perform_update(&h.release(&sha256_hex(NEW_BINARY)))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        JvError::Update {
            phase: UpdatePhase::Replace,
            ..
        }
    ));
    assert!(matches!(err.root(), JvError::RolledBack { .. }));
    assert!(err.to_string().contains("original executable restored"));
    assert_eq!(fs::read(&h.exe).unwrap(), OLD_BINARY);
    assert!(!updater.backup_manager().backup_exists());
}

#[tokio::test]
async fn test_failed_replace_and_restore_is_unrecoverable() {
    let h = UpdateHarness::new().await;
    let backup = h.updater().backup_manager().backup_path().to_path_buf();
    let doomed = backup.clone();
    let updater = h.updater().with_swap(move |_: &Path, target: &Path| -> io::Result<()> {
        fs::remove_file(target)?;
        fs::remove_file(&doomed)?;
        Err(io::Error::other("disk full"))
    });

    let err = updater
        .perform_update(&h.release(&sha256_hex(NEW_BINARY)))
        .await
        .unwrap_err();

    match &err {
        JvError::Unrecoverable {
            update_error,
            rollback_error,
            backup_path,
        } => {
            assert!(update_error.contains("disk full"));
            assert!(!rollback_error.is_empty());
            assert_eq!(backup_path, &backup);
        }
        other => panic!("expected Unrecoverable, got {other:?}"),
    }
    assert_eq!(err.class(), ErrorClass::Unrecoverable);
}

#[tokio::test]
async fn test_manual_rollback() {
    let h = UpdateHarness::new().await;
    let updater = h.updater();
    updater.backup_manager().create_backup().await.unwrap();
    fs::write(&h.exe, b"bad build").unwrap();

    updater.rollback().await.unwrap();
    assert_eq!(fs::read(&h.exe).unwrap(), OLD_BINARY);
    assert!(!updater.backup_manager().backup_exists());

    let err = updater.rollback().await.unwrap_err();
    assert!(matches!(err, JvError::NotFound { .. }));
}

#[tokio::test]
async fn test_github_source() {
    init_test_logging(None);
    let server = MockServer::start().await;
    let sums = format!(
        "{}  jv-linux-x86_64\n{}  jv-windows-x86_64.exe\n",
        sha256_hex(NEW_BINARY),
        "1".repeat(64)
    );
    Mock::given(method("GET"))
        .and(path("/repos/CostaBrosky/jv/releases/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "tag_name": "v0.6.0",
            "assets": [
                {"name": "jv-linux-x86_64", "size": NEW_BINARY.len(),
                 "browser_download_url": format!("{}/dl/jv-linux-x86_64", server.uri())},
                {"name": "jv-windows-x86_64.exe", "size": 10,
                 "browser_download_url": format!("{}/dl/jv-windows-x86_64.exe", server.uri())},
                {"name": "SHA256SUMS.txt", "size": sums.len(),
                 "browser_download_url": format!("{}/dl/SHA256SUMS.txt", server.uri())}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dl/SHA256SUMS.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sums))
        .mount(&server)
        .await;

    let source = GitHubReleaseSource::with_api_base(http_client().unwrap(), server.uri(), "CostaBrosky/jv");
    let latest = source.latest(&Platform::new("linux", "x86_64")).await.unwrap();

    assert_eq!(latest.version, "0.6.0");
    assert_eq!(latest.download.file_name(), "jv-linux-x86_64");
    assert_eq!(latest.download.checksum(), sha256_hex(NEW_BINARY));
    assert_eq!(latest.download.release_name(), Some("v0.6.0"));
}

#[tokio::test]
async fn test_github_source_requires_checksums() {
    init_test_logging(None);
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/CostaBrosky/jv/releases/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "tag_name": "v0.6.0",
            "assets": [
                {"name": "jv-linux-x86_64", "size": 3,
                 "browser_download_url": format!("{}/dl/jv-linux-x86_64", server.uri())}
            ]
        })))
        .mount(&server)
        .await;

    let source = GitHubReleaseSource::with_api_base(http_client().unwrap(), server.uri(), "CostaBrosky/jv");
    let err = source
        .latest(&Platform::new("linux", "x86_64"))
        .await
        .unwrap_err();
    assert!(matches!(err, JvError::ReleaseMetadata { .. }));
    assert!(err.to_string().contains("SHA256SUMS.txt"));
}

#[tokio::test]
async fn test_github_source_unreachable_is_transport() {
    init_test_logging(None);
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let source = GitHubReleaseSource::with_api_base(http_client().unwrap(), server.uri(), "CostaBrosky/jv");
    let err = source
        .latest(&Platform::new("linux", "x86_64"))
        .await
        .unwrap_err();
    assert!(err.is_retriable());
}

fn checker(current: &str, source: FakeSource) -> VersionChecker {
    VersionChecker::new(current, Arc::new(source))
}

#[tokio::test]
async fn test_check_available_records_time() {
    let checker = checker("0.5.2", FakeSource::new(Some(release("0.6.0", "u", "ab"))));
    let mut config = UpdateConfig::default();
    let now = Utc::now();

    let check = checker.check(&mut config, now).await.unwrap();
    assert_eq!(check.available().map(|r| r.version.as_str()), Some("0.6.0"));
    assert_eq!(config.last_check, Some(now));
}

#[tokio::test]
async fn test_check_honours_skip_marker() {
    let checker = checker("0.5.2", FakeSource::new(Some(release("0.6.0", "u", "ab"))));
    let mut config = UpdateConfig {
        skip_version: Some("v0.6.0".to_string()),
        ..UpdateConfig::default()
    };

    let check = checker.check(&mut config, Utc::now()).await.unwrap();
    assert!(matches!(check, UpdateCheck::Skipped(_)));
    assert!(check.available().is_none());
}

#[tokio::test]
async fn test_check_up_to_date_and_disabled() {
    let source = FakeSource::new(Some(release("0.5.2", "u", "ab")));
    let checker = checker("0.5.2", source);
    let mut config = UpdateConfig::default();
    assert_eq!(
        checker.check(&mut config, Utc::now()).await.unwrap(),
        UpdateCheck::UpToDate {
            latest: "0.5.2".to_string()
        }
    );

    let mut disabled = UpdateConfig {
        enabled: false,
        ..UpdateConfig::default()
    };
    assert_eq!(
        checker.check(&mut disabled, Utc::now()).await.unwrap(),
        UpdateCheck::Disabled
    );
    assert!(disabled.last_check.is_none());
}

#[tokio::test]
async fn test_check_failure_is_check_phase() {
    let checker = checker("0.5.2", FakeSource::new(None));
    let mut config = UpdateConfig::default();
    let err = checker.check(&mut config, Utc::now()).await.unwrap_err();
    assert!(matches!(
        err,
        JvError::Update {
            phase: UpdatePhase::Check,
            ..
        }
    ));
    assert!(config.last_check.is_none());
}

#[tokio::test]
async fn test_background_check_reports_update() {
    let checker = checker("0.5.2", FakeSource::new(Some(release("0.6.0", "u", "ab"))));
    let check = BackgroundCheck::spawn(checker, &UpdateConfig::default()).unwrap();

    let report = check.finish(Duration::from_secs(5)).await.unwrap();
    assert_eq!(report.available.as_deref(), Some("0.6.0"));
    assert!(report.notice("0.5.2").unwrap().contains("0.5.2 -> 0.6.0"));
}

#[tokio::test]
async fn test_background_check_is_rate_limited() {
    let source = Arc::new(FakeSource::new(Some(release("0.6.0", "u", "ab"))));
    let checker = VersionChecker::new("0.5.2", source.clone());
    let config = UpdateConfig {
        last_check: Some(Utc::now() - ChronoDuration::hours(1)),
        ..UpdateConfig::default()
    };

    assert!(BackgroundCheck::spawn(checker, &config).is_none());
    assert_eq!(source.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_background_check_swallows_errors_and_timeouts() {
    let failing = checker("0.5.2", FakeSource::new(None));
    let check = BackgroundCheck::spawn(failing, &UpdateConfig::default()).unwrap();
    assert!(check.finish(Duration::from_secs(5)).await.is_none());

    let slow = checker(
        "0.5.2",
        FakeSource::new(Some(release("0.6.0", "u", "ab"))).slow(Duration::from_secs(30)),
    );
    let check = BackgroundCheck::spawn_with_timeout(slow, &UpdateConfig::default(), Duration::from_millis(20))
        .unwrap();
    assert!(check.finish(Duration::from_secs(5)).await.is_none());
}

#[tokio::test]
async fn test_record_check_keeps_other_settings() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("jv.json");
    let mut config = crate::config::Config::empty_at(&path);
    config.add_custom_path(Path::new("/opt/jdk-21"));
    config.save().unwrap();

    let report = CheckReport {
        checked_at: Utc::now(),
        available: None,
    };
    record_check(&path, &report);

    let saved = crate::config::Config::load_from(&path).unwrap();
    assert!(saved.update_config.last_check.is_some());
    assert_eq!(saved.custom_paths.len(), 1);
}
