//! Checksum verification for downloaded artifacts.
//!
//! Files are hashed in fixed-size chunks so large JDK archives never have to fit
//! in memory. Digests are compared case-insensitively, and an optional
//! `sha256:` style prefix on the published value is accepted.

use crate::core::JvError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

const CHUNK_SIZE: usize = 64 * 1024;

/// Digest algorithms publishers use for release artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    Sha256,
    Sha512,
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha256 => f.write_str("sha256"),
            Self::Sha512 => f.write_str("sha512"),
        }
    }
}

impl FromStr for ChecksumAlgorithm {
    type Err = JvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "").as_str() {
            "sha256" => Ok(Self::Sha256),
            "sha512" => Ok(Self::Sha512),
            _ => Err(JvError::UnsupportedChecksum {
                algorithm: s.to_string(),
            }),
        }
    }
}

pub struct ChecksumVerifier;

impl ChecksumVerifier {
    /// Hex digest of `path`, lowercase.
    pub fn compute(path: &Path, algorithm: ChecksumAlgorithm) -> Result<String, JvError> {
        debug!("Computing {algorithm} checksum for {}", path.display());
        let file = File::open(path).map_err(|e| JvError::io("open", path, e))?;
        let digest = match algorithm {
            ChecksumAlgorithm::Sha256 => digest_reader::<Sha256>(file),
            ChecksumAlgorithm::Sha512 => digest_reader::<Sha512>(file),
        };
        digest.map_err(|e| JvError::io("read", path, e))
    }

    /// Fail with [`JvError::ChecksumMismatch`] unless `path` hashes to `expected`.
    pub fn verify(
        path: &Path,
        expected: &str,
        algorithm: ChecksumAlgorithm,
    ) -> Result<(), JvError> {
        let expected = strip_algorithm_prefix(expected);
        let actual = Self::compute(path, algorithm)?;

        if !actual.eq_ignore_ascii_case(expected) {
            return Err(JvError::ChecksumMismatch {
                file: path
                    .file_name()
                    .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned()),
                expected: expected.to_lowercase(),
                actual,
            });
        }

        info!("Checksum verified for {}", path.display());
        Ok(())
    }

    /// [`Self::verify`] on the blocking thread pool.
    pub async fn verify_async(
        path: PathBuf,
        expected: String,
        algorithm: ChecksumAlgorithm,
    ) -> Result<(), JvError> {
        tokio::task::spawn_blocking(move || Self::verify(&path, &expected, algorithm))
            .await
            .map_err(|e| JvError::InvalidInput {
                message: format!("checksum task failed: {e}"),
            })?
    }

    /// Find the digest for `file_name` in a `sha256sum`-style listing.
    ///
    /// Lines look like `<hex>  <name>` or `<hex> *<name>`; names may carry a
    /// directory prefix.
    #[must_use]
    pub fn parse_checksums_file(content: &str, file_name: &str) -> Option<String> {
        content.lines().find_map(|line| {
            let mut parts = line.split_whitespace();
            let checksum = parts.next()?;
            let name = parts.next()?.trim_start_matches('*');
            let matches = name == file_name || name.ends_with(&format!("/{file_name}"));
            matches.then(|| checksum.to_lowercase())
        })
    }
}

fn strip_algorithm_prefix(value: &str) -> &str {
    let value = value.trim();
    value
        .split_once(':')
        .map_or(value, |(_, digest)| digest.trim())
}

fn digest_reader<D: Digest>(mut reader: impl Read) -> io::Result<String> {
    let mut hasher = D::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];
    loop {
        let read = reader.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}
