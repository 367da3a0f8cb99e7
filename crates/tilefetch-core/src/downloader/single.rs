//! Single-stream HTTP GET into a local file.
//!
//! The destination is only created once a 2xx body starts arriving, so an
//! HTTP error never truncates an existing file. A transfer that breaks
//! midway leaves its partial file behind.

use std::cell::Cell;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::DownloadError;
use crate::config::HttpConfig;

const WRITE_BUFFER_SIZE: usize = 256 * 1024;

/// Lazily created output file; remembers the first I/O error so it can be
/// reported instead of curl's generic write error.
struct FileSink {
    path: PathBuf,
    file: Option<BufWriter<File>>,
    written: u64,
    error: Option<std::io::Error>,
}

impl FileSink {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            file: None,
            written: 0,
            error: None,
        }
    }

    fn open(&mut self) -> std::io::Result<&mut BufWriter<File>> {
        let file = match self.file.take() {
            Some(f) => f,
            None => BufWriter::with_capacity(WRITE_BUFFER_SIZE, File::create(&self.path)?),
        };
        Ok(self.file.insert(file))
    }

    fn write(&mut self, data: &[u8]) -> bool {
        let res = self.open().and_then(|f| f.write_all(data));
        match res {
            Ok(()) => {
                self.written += data.len() as u64;
                true
            }
            Err(e) => {
                self.error = Some(e);
                false
            }
        }
    }

    fn io_error(&self, source: std::io::Error) -> DownloadError {
        DownloadError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Flush and close. An empty 2xx body still produces an (empty) file.
    fn finish(mut self) -> Result<u64, DownloadError> {
        if let Err(e) = self.open().and_then(|f| f.flush()) {
            return Err(self.io_error(e));
        }
        Ok(self.written)
    }
}

/// Status code from an HTTP status line (`HTTP/1.1 200 OK`, `HTTP/2 404`).
pub(super) fn parse_status_line(line: &[u8]) -> Option<u32> {
    let line = std::str::from_utf8(line).ok()?;
    if !line.starts_with("HTTP/") {
        return None;
    }
    line.split_whitespace().nth(1)?.parse().ok()
}

fn is_success(code: u32) -> bool {
    (200..300).contains(&code)
}

/// Downloads `url` into `dest` with a single GET. Returns the number of body bytes written.
pub fn download_to_file(url: &str, dest: &Path, http: &HttpConfig) -> Result<u64, DownloadError> {
    let parsed = url::Url::parse(url).map_err(|e| DownloadError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(DownloadError::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme {}", parsed.scheme()),
        });
    }

    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.useragent(&http.user_agent)?;
    easy.connect_timeout(Duration::from_secs(http.connect_timeout_secs))?;
    // Abort stalled transfers so a hung server cannot pin a worker forever.
    if http.low_speed_limit_bytes > 0 {
        easy.low_speed_limit(http.low_speed_limit_bytes)?;
        easy.low_speed_time(Duration::from_secs(http.low_speed_time_secs))?;
    }
    if let Some(secs) = http.timeout_secs {
        easy.timeout(Duration::from_secs(secs))?;
    }

    // Last status line seen; with redirects the final response wins.
    let status = Cell::new(0u32);
    let mut sink = FileSink::new(dest);

    let performed = {
        let mut transfer = easy.transfer();
        transfer.header_function(|line| {
            if let Some(code) = parse_status_line(line) {
                status.set(code);
            }
            true
        })?;
        transfer.write_function(|data| {
            if !is_success(status.get()) {
                // error page body, dropped
                return Ok(data.len());
            }
            if sink.write(data) {
                Ok(data.len())
            } else {
                Ok(0) // abort transfer
            }
        })?;
        transfer.perform()
    };

    if let Err(e) = performed {
        if e.is_write_error() {
            if let Some(io_err) = sink.error.take() {
                return Err(sink.io_error(io_err));
            }
        }
        return Err(DownloadError::Curl(e));
    }

    let code = easy.response_code()?;
    if !is_success(code) {
        return Err(DownloadError::Http { status: code });
    }
    sink.finish()
}
