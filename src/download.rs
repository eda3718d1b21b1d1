//! HTTP file downloads with digest-based skipping.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use crate::files::sha256_file;

const CHUNK_SIZE: usize = 1024 * 1024;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Destination already present (and matching the digest, if given)
    Skipped,
    Downloaded { bytes: u64 },
}

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("GET {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Downloads files over a shared HTTP agent.
#[derive(Clone)]
pub struct Downloader {
    agent: ureq::Agent,
}

impl Default for Downloader {
    fn default() -> Self {
        Self::new()
    }
}

impl Downloader {
    pub fn new() -> Self {
        Self::with_agent(
            ureq::AgentBuilder::new()
                .timeout_connect(CONNECT_TIMEOUT)
                .build(),
        )
    }

    pub fn with_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }

    /// Download `url` to `path`.
    ///
    /// Skips the download when `path` is an existing file and either no digest was
    /// given or its SHA-256 matches `sha256`. Parent directories are
    /// created as needed.
    pub fn download_file(
        &self,
        url: &str,
        path: &Path,
        sha256: Option<&str>,
    ) -> Result<DownloadOutcome, DownloadError> {
        if path.is_file() {
            match sha256 {
                None => {
                    debug!(path = %path.display(), "file exists; skipping download");
                    return Ok(DownloadOutcome::Skipped);
                }
                Some(expected) => {
                    let actual = sha256_file(path).map_err(|source| io_error(path, source))?;
                    if actual.eq_ignore_ascii_case(expected) {
                        debug!(path = %path.display(), "checksum matches; skipping download");
                        return Ok(DownloadOutcome::Skipped);
                    }
                    info!(path = %path.display(), expected, actual = %actual, "checksum mismatch; downloading again");
                }
            }
        }

        let response = match self.agent.get(url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(status, _)) => {
                return Err(DownloadError::Status {
                    url: url.to_string(),
                    status,
                })
            }
            Err(e) => {
                return Err(DownloadError::Transport {
                    url: url.to_string(),
                    reason: e.to_string(),
                })
            }
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| io_error(parent, source))?;
        }

        let mut file = File::create(path).map_err(|source| io_error(path, source))?;
        let bytes = copy_chunked(&mut response.into_reader(), &mut file)
            .map_err(|source| io_error(path, source))?;
        file.flush().map_err(|source| io_error(path, source))?;

        info!(url, path = %path.display(), bytes, "downloaded file");
        Ok(DownloadOutcome::Downloaded { bytes })
    }
}

fn copy_chunked(reader: &mut impl Read, writer: &mut impl Write) -> io::Result<u64> {
    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut total = 0u64;
    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => return Ok(total),
            Ok(read) => read,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        writer.write_all(&buffer[..read])?;
        total += read as u64;
    }
}

fn io_error(path: &Path, source: io::Error) -> DownloadError {
    DownloadError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_copy_chunked_counts_bytes() {
        let data = vec![1u8; CHUNK_SIZE + 5];
        let mut out = Vec::new();
        let copied = copy_chunked(&mut data.as_slice(), &mut out).unwrap();
        assert_eq!(copied, data.len() as u64);
        assert_eq!(out, data);
    }

    #[test]
    fn test_existing_file_without_digest_is_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("image.ova");
        fs::write(&path, b"cached").unwrap();

        // Unroutable URL: the request must never be made.
        let outcome = Downloader::new()
            .download_file("http://127.0.0.1:9/image.ova", &path, None)
            .unwrap();
        assert_eq!(outcome, DownloadOutcome::Skipped);
    }

    #[test]
    fn test_existing_directory_is_not_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("image.ova");
        fs::create_dir(&path).unwrap();

        // Nothing listens on the discard port, so the request itself fails.
        let err = Downloader::new()
            .download_file("http://127.0.0.1:9/image.ova", &path, None)
            .unwrap_err();
        assert!(matches!(err, DownloadError::Transport { .. }));
    }

    #[test]
    fn test_existing_file_with_matching_digest_is_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("image.ova");
        fs::write(&path, b"hello").unwrap();

        let outcome = Downloader::new()
            .download_file(
                "http://127.0.0.1:9/image.ova",
                &path,
                Some("2CF24DBA5FB0A30E26E83B2AC5B9E29E1B161E5C1FA7425E73043362938B9824"),
            )
            .unwrap();
        assert_eq!(outcome, DownloadOutcome::Skipped);
    }
}
