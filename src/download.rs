//! Streaming HTTP downloads.
//!
//! [`Downloader::download`] creates its destination exclusively before the
//! request is sent, streams the body to disk chunk by chunk, and then checks the
//! byte count against the declared `Content-Length` and the size the caller
//! expects. A short or long transfer is reported as
//! [`JvError::IncompleteTransfer`] even when the connection closed cleanly.
//!
//! Downloads are not retried and carry no deadline of their own; callers wrap
//! them in `tokio::time::timeout`. The partial file is removed on failure.

use crate::constants::{CONNECT_TIMEOUT, USER_AGENT};
use crate::core::JvError;
use futures::StreamExt;
use std::path::Path;
use std::sync::Arc;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Bytes received so far and the total, when known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    pub downloaded: u64,
    pub total: Option<u64>,
}

/// Called after every chunk written to disk.
pub type ProgressCallback = Arc<dyn Fn(DownloadProgress) + Send + Sync>;

/// Build the HTTP client shared by every network operation.
pub fn http_client() -> Result<reqwest::Client, JvError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .map_err(|e| JvError::Transport {
            url: String::new(),
            reason: format!("failed to build HTTP client: {e}"),
        })
}

#[derive(Clone)]
pub struct Downloader {
    client: reqwest::Client,
}

impl Downloader {
    #[must_use]
    pub const fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    #[must_use]
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Download `url` into a new file at `dest`, returning the bytes written.
    pub async fn download(
        &self,
        url: &str,
        dest: &Path,
        expected_size: Option<u64>,
        progress: Option<&ProgressCallback>,
    ) -> Result<u64, JvError> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(dest)
            .await
            .map_err(|e| JvError::io("create", dest, e))?;

        let result = self
            .stream_to(&mut file, url, expected_size, progress)
            .await;
        drop(file);

        if result.is_err() {
            let _ = fs::remove_file(dest).await;
        }
        result
    }

    async fn stream_to(
        &self,
        file: &mut fs::File,
        url: &str,
        expected_size: Option<u64>,
        progress: Option<&ProgressCallback>,
    ) -> Result<u64, JvError> {
        debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| JvError::transport(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(JvError::Transport {
                url: url.to_string(),
                reason: format!("HTTP {status}"),
            });
        }

        let declared = response.content_length();
        let total = declared.or(expected_size);
        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| JvError::transport(url, &e))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| JvError::io("write download", url, e))?;
            downloaded += chunk.len() as u64;
            if let Some(callback) = progress {
                callback(DownloadProgress { downloaded, total });
            }
        }

        file.flush()
            .await
            .map_err(|e| JvError::io("flush download", url, e))?;
        file.sync_all()
            .await
            .map_err(|e| JvError::io("sync download", url, e))?;

        for expected in [declared, expected_size].into_iter().flatten() {
            if downloaded != expected {
                return Err(JvError::IncompleteTransfer {
                    url: url.to_string(),
                    expected,
                    received: downloaded,
                });
            }
        }

        info!("Downloaded {downloaded} bytes from {url}");
        Ok(downloaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn serve(body: Vec<u8>, status: u16) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jdk.zip"))
            .respond_with(ResponseTemplate::new(status).set_body_bytes(body))
            .mount(&server)
            .await;
        server
    }

    fn downloader() -> Downloader {
        Downloader::new(http_client().unwrap())
    }

    #[tokio::test]
    async fn test_download_writes_file_and_reports_progress() {
        let body = vec![42u8; 100_000];
        let server = serve(body.clone(), 200).await;
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("jdk.zip");

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let callback: ProgressCallback = Arc::new(move |p| seen_clone.lock().unwrap().push(p));

        let written = downloader()
            .download(&format!("{}/jdk.zip", server.uri()), &dest, Some(100_000), Some(&callback))
            .await
            .unwrap();

        assert_eq!(written, 100_000);
        assert_eq!(std::fs::read(&dest).unwrap(), body);
        let last = *seen.lock().unwrap().last().unwrap();
        assert_eq!(last.downloaded, 100_000);
        assert_eq!(last.total, Some(100_000));
    }

    #[tokio::test]
    async fn test_size_mismatch_is_incomplete_transfer() {
        let server = serve(vec![1u8; 10], 200).await;
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("jdk.zip");

        let err = downloader()
            .download(&format!("{}/jdk.zip", server.uri()), &dest, Some(999), None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            JvError::IncompleteTransfer {
                expected: 999,
                received: 10,
                ..
            }
        ));
        assert!(err.is_retriable());
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_http_error_is_transport() {
        let server = serve(Vec::new(), 404).await;
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("jdk.zip");

        let err = downloader()
            .download(&format!("{}/jdk.zip", server.uri()), &dest, None, None)
            .await
            .unwrap_err();

        assert!(matches!(err, JvError::Transport { .. }));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_existing_destination_is_not_overwritten() {
        let server = serve(vec![1u8; 10], 200).await;
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("jdk.zip");
        std::fs::write(&dest, b"keep").unwrap();

        let err = downloader()
            .download(&format!("{}/jdk.zip", server.uri()), &dest, None, None)
            .await
            .unwrap_err();

        assert!(matches!(err, JvError::FileSystem { .. }));
        assert_eq!(std::fs::read(&dest).unwrap(), b"keep");
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
