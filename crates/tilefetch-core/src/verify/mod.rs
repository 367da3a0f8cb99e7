//! Verification pass: check that every expected output file exists and is
//! at least `min_size` bytes.
//!
//! Read-only with respect to downloaded files; the only write is the report
//! log. Per-file problems are recorded and the scan moves on.

use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::catalog::{Catalog, JobRecord};
use crate::layout::OutputLayout;
use crate::range::RunRange;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyReason {
    Missing,
    TooSmall { size: u64, min_size: u64 },
    AccessError { message: String },
}

/// One non-OK file, written as one line of the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationEntry {
    pub index: usize,
    pub path: PathBuf,
    pub source_url: String,
    pub reason: VerifyReason,
}

impl fmt::Display for VerificationEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self.path.display();
        match &self.reason {
            VerifyReason::Missing => {
                write!(f, "MISSING {} index={} url={}", path, self.index, self.source_url)
            }
            VerifyReason::TooSmall { size, min_size } => write!(
                f,
                "TOO_SMALL {} size={} min={} index={} url={}",
                path, size, min_size, self.index, self.source_url
            ),
            VerifyReason::AccessError { message } => {
                write!(f, "ACCESS_ERROR {} index={} error={}", path, self.index, message)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VerifySummary {
    pub checked: usize,
    pub ok: usize,
    pub missing: usize,
    pub too_small: usize,
    pub access_errors: usize,
}

impl VerifySummary {
    pub fn problems(&self) -> usize {
        self.missing + self.too_small + self.access_errors
    }

    fn record(&mut self, reason: &VerifyReason) {
        match reason {
            VerifyReason::Missing => self.missing += 1,
            VerifyReason::TooSmall { .. } => self.too_small += 1,
            VerifyReason::AccessError { .. } => self.access_errors += 1,
        }
    }
}

/// UTC timestamp that prefixes every report line.
fn report_timestamp() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

/// Stat `path` and classify it. Returns the size when the file is acceptable.
pub fn check_file(path: &Path, min_size: u64) -> Result<u64, VerifyReason> {
    let meta = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(VerifyReason::Missing),
        Err(e) => {
            return Err(VerifyReason::AccessError {
                message: e.to_string(),
            })
        }
    };
    if !meta.is_file() {
        return Err(VerifyReason::AccessError {
            message: "not a regular file".to_string(),
        });
    }
    let size = meta.len();
    if size < min_size {
        return Err(VerifyReason::TooSmall { size, min_size });
    }
    Ok(size)
}

/// Check `records` (catalog positions starting at `first_index`) and write one
/// timestamped line per problem to `sink`. Only a failing `sink` aborts the scan.
pub fn verify_records<W: Write>(
    records: &[JobRecord],
    first_index: usize,
    layout: &OutputLayout,
    min_size: u64,
    sink: &mut W,
) -> io::Result<VerifySummary> {
    let mut summary = VerifySummary::default();
    for (offset, record) in records.iter().enumerate() {
        let path = layout.path_for(record);
        summary.checked += 1;
        match check_file(&path, min_size) {
            Ok(_) => summary.ok += 1,
            Err(reason) => {
                summary.record(&reason);
                let entry = VerificationEntry {
                    index: first_index + offset,
                    path,
                    source_url: record.source_url.clone(),
                    reason,
                };
                tracing::debug!("{}", entry);
                writeln!(sink, "{} {}", report_timestamp(), entry)?;
            }
        }
    }
    Ok(summary)
}

/// Verify the `range` slice of `catalog`, writing the report to `log_path`
/// (created or truncated; parent directories are created).
pub fn verify_to_log(
    catalog: &Catalog,
    range: &RunRange,
    layout: &OutputLayout,
    min_size: u64,
    log_path: &Path,
) -> io::Result<VerifySummary> {
    if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut log = BufWriter::new(File::create(log_path)?);

    let bounds = range.bounds(catalog.len());
    let first = bounds.start;
    let summary = verify_records(&catalog.records()[bounds], first, layout, min_size, &mut log)?;
    log.flush()?;

    tracing::info!(
        checked = summary.checked,
        ok = summary.ok,
        missing = summary.missing,
        too_small = summary.too_small,
        access_errors = summary.access_errors,
        log = %log_path.display(),
        "verification finished"
    );
    Ok(summary)
}
