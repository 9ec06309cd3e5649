use chrono::Utc;
use jv_cli::core::{ErrorClass, JvError, UpdatePhase};
use jv_cli::distributor::Platform;
use jv_cli::download::{Downloader, http_client};
use jv_cli::test_utils::{init_test_logging, sha256_hex};
use jv_cli::upgrade::{GitHubReleaseSource, SelfUpdater, UpdateCheck, UpdateConfig, VersionChecker};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ASSET: &str = "jv-linux-x86_64";
const CURRENT: &[u8] = b"jv 0.5.2";
const LATEST: &[u8] = b"jv 0.6.0";

struct ReleaseServer {
    server: MockServer,
    temp: TempDir,
    exe: PathBuf,
}

impl ReleaseServer {
    async fn new(published_sum: &str) -> Self {
        init_test_logging(None);
        let server = MockServer::start().await;
        let sums = format!("{published_sum}  {ASSET}\n");

        Mock::given(method("GET"))
            .and(path("/repos/CostaBrosky/jv/releases/latest"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "tag_name": "v0.6.0",
                "assets": [
                    {"name": ASSET, "size": LATEST.len(),
                     "browser_download_url": format!("{}/download/{ASSET}", server.uri())},
                    {"name": "SHA256SUMS.txt", "size": sums.len(),
                     "browser_download_url": format!("{}/download/SHA256SUMS.txt", server.uri())}
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/download/SHA256SUMS.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string(sums))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/download/{ASSET}")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(LATEST))
            .mount(&server)
            .await;

        let temp = TempDir::new().unwrap();
        let exe = temp.path().join("jv");
        fs::write(&exe, CURRENT).unwrap();
        Self { server, temp, exe }
    }

    fn checker(&self) -> VersionChecker {
        let source =
            GitHubReleaseSource::with_api_base(http_client().unwrap(), self.server.uri(), "CostaBrosky/jv");
        VersionChecker::new("0.5.2", Arc::new(source)).with_platform(Platform::new("linux", "x86_64"))
    }

    fn updater(&self) -> SelfUpdater {
        SelfUpdater::new(Downloader::new(http_client().unwrap()), self.exe.clone())
            .cleanup_grace(Duration::from_millis(50))
            .restore_policy(2, Duration::from_millis(10))
    }

    fn backup(&self) -> PathBuf {
        self.temp.path().join("jv.backup")
    }
}

#[tokio::test]
async fn test_check_then_update() {
    let server = ReleaseServer::new(&sha256_hex(LATEST)).await;
    let mut config = UpdateConfig::default();

    let check = server.checker().check(&mut config, Utc::now()).await.unwrap();
    let UpdateCheck::Available(release) = check else {
        panic!("expected an update, got {check:?}");
    };
    assert_eq!(release.version, "0.6.0");
    assert!(config.last_check.is_some());

    let outcome = server.updater().perform_update(&release).await.unwrap();
    assert_eq!(fs::read(&server.exe).unwrap(), LATEST);
    outcome.cleanup.await.unwrap();
    assert!(!server.backup().exists());
}

#[tokio::test]
async fn test_tampered_binary_is_rejected() {
    let server = ReleaseServer::new(&"f".repeat(64)).await;
    let release = server.checker().latest().await.unwrap();

    let err = server.updater().perform_update(&release).await.unwrap_err();
    assert!(matches!(
        err,
        JvError::Update {
            phase: UpdatePhase::Verify,
            ..
        }
    ));
    assert_eq!(err.class(), ErrorClass::Integrity);
    assert_eq!(fs::read(&server.exe).unwrap(), CURRENT);
    assert!(!server.backup().exists());
}

#[tokio::test]
async fn test_failed_replace_restores_original_bytes() {
    let server = ReleaseServer::new(&sha256_hex(LATEST)).await;
    let release = server.checker().latest().await.unwrap();

    let updater = server
        .updater()
        .with_swap(|_new: &Path, exe: &Path| -> io::Result<()> {
            fs::write(exe, b"half written")?;
            Err(io::Error::other("disk full"))
        });
    let err = updater.perform_update(&release).await.unwrap_err();

    assert!(matches!(err.root(), JvError::RolledBack { .. }));
    assert_eq!(fs::read(&server.exe).unwrap(), CURRENT);
    assert!(!server.backup().exists());
}
