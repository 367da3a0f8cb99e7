//! Downloader: fetch one URL into one local file.
//!
//! `Fetch` is the seam the scheduler drives; `CurlFetcher` is the blocking
//! libcurl implementation used in production. No retries happen here.

mod error;
mod single;

pub use error::DownloadError;
pub use single::download_to_file;

use std::path::Path;

use crate::config::HttpConfig;

/// Fetches `url` into `dest`, returning the number of bytes written.
pub trait Fetch {
    fn fetch(&self, url: &str, dest: &Path) -> Result<u64, DownloadError>;
}

/// Blocking libcurl fetcher. Each call uses its own `Easy` handle, so one
/// fetcher can be shared by every worker.
#[derive(Debug, Clone, Default)]
pub struct CurlFetcher {
    http: HttpConfig,
}

impl CurlFetcher {
    pub fn new(http: HttpConfig) -> Self {
        Self { http }
    }
}

impl Fetch for CurlFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<u64, DownloadError> {
        download_to_file(url, dest, &self.http)
    }
}
