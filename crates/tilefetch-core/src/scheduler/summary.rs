//! Per-job results and the aggregated run summary.

use std::path::PathBuf;
use std::time::Duration;

use crate::downloader::DownloadError;

/// Result of one download attempt.
#[derive(Debug)]
pub struct JobOutcome {
    pub index: usize,
    pub url: String,
    pub dest: PathBuf,
    pub result: Result<u64, DownloadError>,
}

#[derive(Debug)]
pub struct JobFailure {
    pub index: usize,
    pub url: String,
    pub dest: PathBuf,
    pub error: DownloadError,
}

/// Aggregate of a download run.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Jobs handed to a worker (succeeded + failed + panicked).
    pub attempted: usize,
    pub succeeded: usize,
    /// Body bytes written by successful downloads.
    pub bytes: u64,
    /// Failed downloads, sorted by catalog index.
    pub failures: Vec<JobFailure>,
    /// Jobs whose worker panicked; their index is unknown.
    pub panicked: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    /// Fold one finished job in. Successes are reduced to counters.
    pub(crate) fn record(&mut self, job: JobOutcome) {
        self.attempted += 1;
        match job.result {
            Ok(bytes) => {
                self.succeeded += 1;
                self.bytes += bytes;
            }
            Err(error) => self.failures.push(JobFailure {
                index: job.index,
                url: job.url,
                dest: job.dest,
                error,
            }),
        }
    }

    pub(crate) fn finish(&mut self, panicked: usize, elapsed: Duration) {
        self.attempted += panicked;
        self.panicked = panicked;
        self.elapsed = elapsed;
        self.failures.sort_by_key(|f| f.index);
    }

    pub fn failed(&self) -> usize {
        self.failures.len() + self.panicked
    }

    /// True when every attempted job succeeded.
    pub fn is_complete(&self) -> bool {
        self.failed() == 0
    }
}
