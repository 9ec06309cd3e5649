use jv_cli::config::{Config, InstallScope};
use jv_cli::core::{ErrorClass, InstallPhase, JvError};
use jv_cli::discovery::{Detector, JdkSource, resolve};
use jv_cli::distributor::{DownloadInfo, Platform};
use jv_cli::download::{Downloader, http_client};
use jv_cli::installer::{InstallLayout, InstallRequest, PackageInstaller, uninstall};
use jv_cli::test_utils::{ArchiveFixture, StaticDistributor, init_test_logging, sha256_hex};
use jv_cli::verification::ChecksumAlgorithm;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Catalog {
    server: MockServer,
    temp: TempDir,
}

impl Catalog {
    async fn new() -> Self {
        init_test_logging(None);
        Self {
            server: MockServer::start().await,
            temp: TempDir::new().unwrap(),
        }
    }

    async fn package(&self, name: &str, body: Vec<u8>) -> DownloadInfo {
        let info = DownloadInfo::new(
            format!("{}/{name}", self.server.uri()),
            body.len() as u64,
            sha256_hex(&body),
            ChecksumAlgorithm::Sha256,
            name,
        )
        .unwrap();
        Mock::given(method("GET"))
            .and(path(format!("/{name}")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
            .mount(&self.server)
            .await;
        info
    }

    fn installer(&self) -> PackageInstaller {
        let layout = InstallLayout::new(self.temp.path().join("system"), self.temp.path().join("user"));
        PackageInstaller::new(Downloader::new(http_client().unwrap()), layout).elevated(false)
    }

    fn config(&self) -> Config {
        Config::load_from(&self.temp.path().join("jv.json")).unwrap()
    }
}

#[tokio::test]
async fn test_install_reinstall_discover_uninstall() {
    let catalog = Catalog::new().await;
    let tarball = ArchiveFixture::jdk("jdk-21.0.2+13").tar_gz();
    let distributor = StaticDistributor::new("adoptium", "Eclipse Adoptium")
        .with_package("21", catalog.package("jdk21.tar.gz", tarball).await);
    let installer = catalog.installer();
    let request = InstallRequest::new(&distributor, "21", InstallScope::User, Platform::current());

    let mut config = catalog.config();
    let first = installer.install_and_record(&request, &mut config).await.unwrap();
    let second = installer.install_and_record(&request, &mut config).await.unwrap();
    assert!(!first.replaced_existing);
    assert!(second.replaced_existing);

    let saved = catalog.config();
    assert_eq!(saved.installed_jdks.len(), 1);
    assert_eq!(saved.installed_jdks[0].version, "21");
    assert_eq!(saved.installed_jdks[0].scope, InstallScope::User);
    assert_eq!(saved.custom_paths.len(), 1);

    let installs = Detector::with_standard_roots(Vec::new()).find_all(&saved);
    let found = resolve(&installs, "21").unwrap();
    assert_eq!(found.source, JdkSource::Installed);
    assert_eq!(found.path, first.record.path);

    let mut config = saved;
    uninstall(&mut config, &first.record.path).unwrap();
    assert!(!first.record.path.exists());
    assert!(catalog.config().installed_jdks.is_empty());
    assert!(catalog.config().custom_paths.is_empty());
}

#[tokio::test]
async fn test_install_macos_bundle_zip() {
    let catalog = Catalog::new().await;
    let zip = ArchiveFixture::new()
        .executable("jdk-17.0.9+9/Contents/Home/bin/java", b"#!/bin/sh\n")
        .executable("jdk-17.0.9+9/Contents/Home/bin/java.exe", b"MZ")
        .file("jdk-17.0.9+9/Contents/Info.plist", b"<plist/>")
        .zip();
    let distributor = StaticDistributor::new("adoptium", "Eclipse Adoptium")
        .with_package("17", catalog.package("jdk17.zip", zip).await);

    let mut config = catalog.config();
    let request = InstallRequest::new(&distributor, "17", InstallScope::User, Platform::current());
    let outcome = catalog
        .installer()
        .install_and_record(&request, &mut config)
        .await
        .unwrap();

    assert!(outcome.record.path.ends_with("jdk-17/Contents/Home"));
    assert!(outcome.record.path.join("bin").is_dir());
    assert!(
        outcome
            .record
            .path
            .parent()
            .unwrap()
            .join("Info.plist")
            .is_file()
    );
}

#[tokio::test]
async fn test_corrupt_download_records_nothing() {
    let catalog = Catalog::new().await;
    let body = ArchiveFixture::jdk("jdk-21").tar_gz();
    let served = catalog.package("jdk21.tar.gz", body).await;
    let tampered = DownloadInfo::new(
        served.url(),
        served.expected_size().unwrap_or_default(),
        "0".repeat(64),
        ChecksumAlgorithm::Sha256,
        served.file_name(),
    )
    .unwrap();
    let distributor =
        StaticDistributor::new("adoptium", "Eclipse Adoptium").with_package("21", tampered);

    let mut config = catalog.config();
    let request = InstallRequest::new(&distributor, "21", InstallScope::User, Platform::current());
    let err = catalog
        .installer()
        .install_and_record(&request, &mut config)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        JvError::Install {
            phase: InstallPhase::Verify,
            ..
        }
    ));
    assert_eq!(err.class(), ErrorClass::Integrity);
    assert!(!catalog.temp.path().join("jv.json").exists());
    assert!(!catalog.temp.path().join("user").join("jdk-21").exists());
}
