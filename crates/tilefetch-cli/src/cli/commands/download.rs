//! `--download`: fetch every selected tile with the worker pool.

use anyhow::{Context, Result};
use tilefetch_core::catalog;
use tilefetch_core::config::RunConfig;
use tilefetch_core::downloader::CurlFetcher;
use tilefetch_core::layout::OutputLayout;
use tilefetch_core::pool::WorkerPool;
use tilefetch_core::scheduler::{self, RunSummary};

pub fn run_download(cfg: &RunConfig) -> Result<RunSummary> {
    let catalog = catalog::load_catalog(&cfg.input)?;
    let layout = OutputLayout::new(&cfg.output_dir, cfg.naming.clone())?;
    layout
        .create_dir()
        .with_context(|| format!("failed to create output directory {}", layout.dir().display()))?;

    let selected = cfg.range.bounds(catalog.len());
    if selected.is_empty() {
        tracing::warn!(
            start = cfg.range.start,
            catalog_len = catalog.len(),
            "run range selects no records"
        );
    }
    let mut pool = WorkerPool::new(cfg.workers.resolve_local_for(selected.len()));
    if let Some(capacity) = cfg.queue_capacity {
        pool = pool.with_queue_capacity(capacity);
    }
    tracing::info!(
        jobs = selected.len(),
        first = selected.start,
        workers = pool.workers(),
        out = %layout.dir().display(),
        "starting downloads"
    );

    let fetcher = CurlFetcher::new(cfg.http.clone());
    let summary = scheduler::run_downloads(
        scheduler::plan_jobs(&catalog, &cfg.range, &layout),
        &fetcher,
        &pool,
    );
    print_summary(&summary);
    Ok(summary)
}

fn print_summary(summary: &RunSummary) {
    let mib = summary.bytes as f64 / 1_048_576.0;
    println!(
        "Downloaded {} of {} file(s), {:.1} MiB in {:.1}s",
        summary.succeeded,
        summary.attempted,
        mib,
        summary.elapsed.as_secs_f64()
    );
    for f in &summary.failures {
        println!("  FAILED [{}] {} -> {}: {}", f.index, f.url, f.dest.display(), f.error);
    }
    if summary.panicked > 0 {
        println!("  {} job(s) aborted by a worker panic", summary.panicked);
    }
}
