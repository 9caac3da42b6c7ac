//! Blocking HTTP GET into a file (libcurl easy interface).
//!
//! Used for both the version descriptor and the update payload. The body is
//! written sequentially and hashed on the fly.

use crate::config::UpdaterConfig;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Write};
use std::time::Duration;

const MAX_REDIRECTIONS: u32 = 10;

#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// No URL configured.
    #[error("no URL configured")]
    MissingUrl,
    /// Curl reported an error (bad URL, timeout, connection, etc.).
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// HTTP response had a non-2xx status.
    #[error("HTTP {0}")]
    Http(u32),
    /// Fewer bytes arrived than the server announced.
    #[error("partial transfer: expected {expected} bytes, got {received}")]
    PartialTransfer { expected: u64, received: u64 },
    /// Transfer succeeded but the body was empty.
    #[error("empty response body")]
    Empty,
    /// Writing the body to disk failed.
    #[error("storage: {0}")]
    Storage(#[source] io::Error),
}

/// Per-request curl settings.
#[derive(Debug, Clone)]
pub struct TransferOptions {
    pub connect_timeout: Duration,
    pub timeout: Duration,
    pub user_agent: String,
}

impl From<&UpdaterConfig> for TransferOptions {
    fn from(cfg: &UpdaterConfig) -> Self {
        Self {
            connect_timeout: cfg.connect_timeout(),
            timeout: cfg.timeout(),
            user_agent: cfg.user_agent.clone(),
        }
    }
}

/// What a completed transfer delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub bytes: u64,
    /// Lowercase hex SHA-256 of the body.
    pub sha256: String,
}

/// GETs `url` and writes the body to `file` from its current position.
/// Follows redirects and never reuses a cached connection.
pub fn fetch_to_file(
    url: &str,
    file: &mut File,
    opts: &TransferOptions,
) -> Result<Transfer, TransferError> {
    if url.is_empty() {
        return Err(TransferError::MissingUrl);
    }

    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.max_redirections(MAX_REDIRECTIONS)?;
    easy.fresh_connect(true)?;
    easy.useragent(&opts.user_agent)?;
    easy.connect_timeout(opts.connect_timeout)?;
    easy.timeout(opts.timeout)?;

    let mut hasher = Sha256::new();
    let mut written = 0u64;
    let mut write_err: Option<io::Error> = None;

    let performed = {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| match file.write_all(data) {
            Ok(()) => {
                hasher.update(data);
                written += data.len() as u64;
                Ok(data.len())
            }
            Err(e) => {
                tracing::warn!("transfer write failed: {}", e);
                write_err = Some(e);
                Ok(0) // abort transfer
            }
        })?;
        transfer.perform()
    };

    if let Some(e) = write_err {
        return Err(TransferError::Storage(e));
    }
    performed?;

    // 0 for non-HTTP schemes such as file://
    let code = easy.response_code()?;
    if code != 0 && !(200..300).contains(&code) {
        return Err(TransferError::Http(code));
    }

    let announced = easy.content_length_download()?;
    if announced >= 0.0 && announced as u64 != written {
        return Err(TransferError::PartialTransfer {
            expected: announced as u64,
            received: written,
        });
    }

    file.flush().map_err(TransferError::Storage)?;

    Ok(Transfer {
        bytes: written,
        sha256: hex::encode(hasher.finalize()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Seek, SeekFrom};

    fn opts() -> TransferOptions {
        TransferOptions::from(&UpdaterConfig::default())
    }

    #[test]
    fn options_follow_config() {
        let mut cfg = UpdaterConfig::default();
        cfg.connect_timeout_secs = 3;
        cfg.timeout_secs = 9;
        cfg.user_agent = "Test/1".to_string();
        let o = TransferOptions::from(&cfg);
        assert_eq!(o.connect_timeout, Duration::from_secs(3));
        assert_eq!(o.timeout, Duration::from_secs(9));
        assert_eq!(o.user_agent, "Test/1");
    }

    #[test]
    fn empty_url_is_rejected_before_curl() {
        let mut out = tempfile::tempfile().unwrap();
        let err = fetch_to_file("", &mut out, &opts()).unwrap_err();
        assert!(matches!(err, TransferError::MissingUrl));
    }

    #[test]
    fn file_url_copies_and_hashes() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("payload.bin");
        std::fs::write(&src, b"hello\n").unwrap();
        let url = url::Url::from_file_path(&src).unwrap();

        let mut out = tempfile::tempfile().unwrap();
        let t = fetch_to_file(url.as_str(), &mut out, &opts()).unwrap();
        assert_eq!(t.bytes, 6);
        assert_eq!(
            t.sha256,
            "5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03"
        );

        out.seek(SeekFrom::Start(0)).unwrap();
        let mut back = Vec::new();
        out.read_to_end(&mut back).unwrap();
        assert_eq!(back, b"hello\n");
    }

    #[test]
    fn missing_file_url_is_curl_error() {
        let dir = tempfile::tempdir().unwrap();
        let url = url::Url::from_file_path(dir.path().join("absent.bin")).unwrap();
        let mut out = tempfile::tempfile().unwrap();
        let err = fetch_to_file(url.as_str(), &mut out, &opts()).unwrap_err();
        assert!(matches!(err, TransferError::Curl(_)));
    }
}
