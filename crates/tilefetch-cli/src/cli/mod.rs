//! CLI for tilefetch.

mod commands;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use std::path::PathBuf;
use std::process::ExitCode;
use tilefetch_core::config::{
    self, min_size_from_flag, ConfigError, FileConfig, Mode, RunConfig, WorkerCount,
};
use tilefetch_core::range::RunRange;
use tilefetch_core::scheduler::RunSummary;

use commands::{run_download, run_verify};

/// Bulk-download raster tiles listed in a GeoJSON catalog, or verify a previous download.
#[derive(Debug, Parser)]
#[command(name = "tilefetch", version)]
#[command(about = "Bulk raster tile downloader and verifier", long_about = None)]
#[command(group(ArgGroup::new("mode").required(true).args(["download", "verify"])))]
pub struct Cli {
    /// Catalog file (GeoJSON feature collection with link_data/kachel/datum properties).
    #[arg(long = "in", value_name = "PATH")]
    pub input: PathBuf,

    /// Output directory for downloaded tiles.
    #[arg(long, default_value = "/downloads", value_name = "DIR")]
    pub out: PathBuf,

    /// Verify-mode report file.
    #[arg(long, default_value = "./missing_or_small_files.log", value_name = "PATH")]
    pub log: PathBuf,

    /// Minimum file size in bytes for a tile to count as valid.
    #[arg(long, default_value_t = 10_000, allow_negative_numbers = true, value_name = "BYTES")]
    pub minsize: i64,

    /// Download every selected tile.
    #[arg(long)]
    pub download: bool,

    /// Check that every selected tile exists and is at least --minsize bytes.
    #[arg(long)]
    pub verify: bool,

    /// Concurrent downloads (-1 = automatic). Capped at twice the CPU count.
    #[arg(long, default_value_t = 1, allow_negative_numbers = true, value_name = "N")]
    pub workers: i64,

    /// First catalog index to process.
    #[arg(long, default_value_t = 0, allow_negative_numbers = true, value_name = "INDEX")]
    pub start: i64,

    /// Last catalog index to process, inclusive (-1 = through the end).
    #[arg(long, default_value_t = -1, allow_negative_numbers = true, value_name = "INDEX")]
    pub end: i64,

    /// Config file (default: ~/.config/tilefetch/config.toml when present).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub fn mode(&self) -> Mode {
        if self.download {
            Mode::Download
        } else {
            Mode::Verify
        }
    }

    /// Combine flags with the file config into a validated run config.
    pub fn into_run_config(self, file: FileConfig) -> Result<RunConfig, ConfigError> {
        let cfg = RunConfig {
            mode: self.mode(),
            min_size: min_size_from_flag(self.minsize)?,
            workers: WorkerCount::from_flag(self.workers)?,
            range: RunRange::from_flags(self.start, self.end)?,
            input: self.input,
            output_dir: self.out,
            verify_log: self.log,
            http: file.http,
            naming: file.naming,
            queue_capacity: file.queue_capacity,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn run(self) -> Result<ExitCode> {
        let file_cfg = config::load_file_config(self.config.as_deref())
            .context("failed to load config file")?;
        let cfg = self.into_run_config(file_cfg)?;
        tracing::debug!("run config: {:?}", cfg);

        match cfg.mode {
            Mode::Download => {
                let summary = run_download(&cfg)?;
                Ok(download_exit_code(&summary))
            }
            Mode::Verify => {
                run_verify(&cfg)?;
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

/// A download run fails as a whole when any job failed.
fn download_exit_code(summary: &RunSummary) -> ExitCode {
    if summary.is_complete() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
