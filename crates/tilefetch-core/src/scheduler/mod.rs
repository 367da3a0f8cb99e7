//! Download scheduler.
//!
//! Turns the selected catalog slice into download jobs and runs them on a
//! `WorkerPool`. Failures are recorded per job and never stop the batch.

mod summary;

pub use summary::{JobFailure, JobOutcome, RunSummary};

use std::path::PathBuf;
use std::time::Instant;

use crate::catalog::Catalog;
use crate::downloader::Fetch;
use crate::layout::OutputLayout;
use crate::pool::WorkerPool;
use crate::range::RunRange;

/// One unit of work for a download worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJob {
    /// Position in the full catalog.
    pub index: usize,
    pub url: String,
    pub dest: PathBuf,
}

/// Jobs for the records selected by `range`, in catalog order.
pub fn plan_jobs<'a>(
    catalog: &'a Catalog,
    range: &RunRange,
    layout: &'a OutputLayout,
) -> impl Iterator<Item = DownloadJob> + 'a {
    let bounds = range.bounds(catalog.len());
    let first = bounds.start;
    catalog.records()[bounds]
        .iter()
        .enumerate()
        .map(move |(offset, record)| DownloadJob {
            index: first + offset,
            url: record.source_url.clone(),
            dest: layout.path_for(record),
        })
}

fn run_job<F: Fetch>(fetcher: &F, job: DownloadJob) -> JobOutcome {
    tracing::info!(index = job.index, url = %job.url, "downloading");
    let result = fetcher.fetch(&job.url, &job.dest);
    match &result {
        Ok(bytes) => tracing::info!(
            index = job.index,
            path = %job.dest.display(),
            bytes,
            "downloaded"
        ),
        Err(e) => tracing::warn!(
            index = job.index,
            url = %job.url,
            path = %job.dest.display(),
            kind = e.kind(),
            "download failed: {}",
            e
        ),
    }
    JobOutcome {
        index: job.index,
        url: job.url,
        dest: job.dest,
        result,
    }
}

/// Runs every job exactly once on `pool` and waits for all of them.
pub fn run_downloads<I, F>(jobs: I, fetcher: &F, pool: &WorkerPool) -> RunSummary
where
    I: IntoIterator<Item = DownloadJob>,
    I::IntoIter: Send,
    F: Fetch + Sync,
{
    let started = Instant::now();
    let mut summary = RunSummary::default();
    let panicked = pool.run_each(jobs, |job| run_job(fetcher, job), |outcome| {
        summary.record(outcome)
    });
    summary.finish(panicked, started.elapsed());
    tracing::info!(
        attempted = summary.attempted,
        succeeded = summary.succeeded,
        failed = summary.failed(),
        bytes = summary.bytes,
        elapsed_secs = summary.elapsed.as_secs_f64(),
        "download run finished"
    );
    summary
}
