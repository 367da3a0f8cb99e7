//! Per-download error type. Reported per job; never aborts a batch.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// Link could not be parsed or is not http(s).
    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    /// Curl reported a transport error (DNS, connect, timeout, reset, ...).
    #[error("transfer failed: {0}")]
    Curl(#[from] curl::Error),
    /// Final response had a non-2xx status.
    #[error("HTTP {status}")]
    Http { status: u32 },
    /// Creating or writing the destination file failed.
    #[error("write {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DownloadError {
    /// Short label used in logs and run summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            DownloadError::InvalidUrl { .. } => "invalid-url",
            DownloadError::Curl(_) => "network",
            DownloadError::Http { .. } => "http",
            DownloadError::Io { .. } => "io",
        }
    }
}
