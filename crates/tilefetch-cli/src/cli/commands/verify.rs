//! `--verify`: report missing and undersized tiles.

use anyhow::{Context, Result};
use tilefetch_core::catalog;
use tilefetch_core::config::RunConfig;
use tilefetch_core::layout::OutputLayout;
use tilefetch_core::verify::{self, VerifySummary};

pub fn run_verify(cfg: &RunConfig) -> Result<VerifySummary> {
    let catalog = catalog::load_catalog(&cfg.input)?;
    let layout = OutputLayout::new(&cfg.output_dir, cfg.naming.clone())?;

    let summary = verify::verify_to_log(&catalog, &cfg.range, &layout, cfg.min_size, &cfg.verify_log)
        .with_context(|| format!("failed to write verify log {}", cfg.verify_log.display()))?;

    println!(
        "File scan complete: {} checked, {} ok, {} missing, {} too small, {} inaccessible",
        summary.checked, summary.ok, summary.missing, summary.too_small, summary.access_errors
    );
    println!("Log written to: {}", cfg.verify_log.display());
    Ok(summary)
}
