//! Output path derivation shared by the download and verify passes.
//!
//! The output directory is made absolute once, when the layout is built;
//! `path_for` is then a pure string join.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::catalog::JobRecord;

/// File naming convention: `<prefix>_<tile>_<date>.<extension>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    pub prefix: String,
    pub extension: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            prefix: "dgm".to_string(),
            extension: "xyz".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("cannot resolve output directory {}", .dir.display())]
pub struct PathResolutionError {
    pub dir: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Resolved output directory plus naming convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    dir: PathBuf,
    naming: NamingConfig,
}

impl OutputLayout {
    /// Resolve `output_dir` against the current directory. The directory does not need to exist.
    pub fn new(output_dir: &Path, naming: NamingConfig) -> Result<Self, PathResolutionError> {
        let dir = std::path::absolute(output_dir).map_err(|source| PathResolutionError {
            dir: output_dir.to_path_buf(),
            source,
        })?;
        Ok(Self { dir, naming })
    }

    /// Absolute output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the output directory and its parents. Download mode only.
    pub fn create_dir(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.dir)
    }

    pub fn file_name_for(&self, record: &JobRecord) -> String {
        let mut name = format!(
            "{}_{}_{}",
            self.naming.prefix,
            sanitize(&record.tile_id),
            sanitize(&record.date)
        );
        if !self.naming.extension.is_empty() {
            name.push('.');
            name.push_str(&self.naming.extension);
        }
        name
    }

    pub fn path_for(&self, record: &JobRecord) -> PathBuf {
        self.dir.join(self.file_name_for(record))
    }
}

/// Keep record fields from introducing path components.
fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect::<String>()
        .replace("..", "__")
}
