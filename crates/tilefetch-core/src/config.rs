//! Run configuration.
//!
//! `FileConfig` holds the optional settings from `~/.config/tilefetch/config.toml`;
//! `RunConfig` is the immutable, validated view of one invocation (CLI flags
//! plus file config) handed to every component.

use serde::{Deserialize, Serialize};
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

pub use crate::layout::NamingConfig;
use crate::range::{RangeError, RunRange};

/// HTTP client settings for the downloader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    /// Seconds allowed for the TCP/TLS connect phase.
    pub connect_timeout_secs: u64,
    /// Abort when throughput stays below this many bytes/s for `low_speed_time_secs`. 0 disables.
    pub low_speed_limit_bytes: u32,
    pub low_speed_time_secs: u64,
    /// Hard wall-clock limit per download (None = unlimited).
    pub timeout_secs: Option<u64>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("tilefetch/", env!("CARGO_PKG_VERSION")).to_string(),
            connect_timeout_secs: 30,
            low_speed_limit_bytes: 1024,
            low_speed_time_secs: 60,
            timeout_secs: None,
        }
    }
}

/// Settings loaded from the TOML config file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub http: HttpConfig,
    pub naming: NamingConfig,
    /// Bounded job queue size (None = twice the worker count).
    pub queue_capacity: Option<usize>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot locate config directory")]
    Xdg(#[from] xdg::BaseDirectoriesError),
    #[error("failed to read config {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}", .path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{0} path must not be empty")]
    EmptyPath(&'static str),
    #[error("workers must be >= 1 or -1 for automatic (got {0})")]
    InvalidWorkers(i64),
    #[error("minsize must be >= 0 (got {0})")]
    NegativeMinSize(i64),
    #[error("queue_capacity must be >= 1")]
    ZeroQueueCapacity,
    #[error(transparent)]
    Range(#[from] RangeError),
}

/// Existing config file under the XDG config dir, if any.
pub fn find_config_file() -> Result<Option<PathBuf>, ConfigError> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("tilefetch")?;
    Ok(xdg_dirs.find_config_file("config.toml"))
}

/// Load the file config. An explicit path must exist; the default path is optional
/// and missing means built-in defaults. Nothing is written.
pub fn load_file_config(explicit: Option<&Path>) -> Result<FileConfig, ConfigError> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => match find_config_file()? {
            Some(p) => p,
            None => {
                tracing::debug!("no config file found, using defaults");
                return Ok(FileConfig::default());
            }
        },
    };
    let data = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    let cfg: FileConfig =
        toml::from_str(&data).map_err(|source| ConfigError::Toml { path: path.clone(), source })?;
    tracing::debug!("loaded config from {}", path.display());
    Ok(cfg)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Download,
    Verify,
}

/// Requested number of download workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerCount {
    Auto,
    Fixed(usize),
}

impl WorkerCount {
    /// `-1` selects automatic sizing; otherwise the value must be positive.
    pub fn from_flag(value: i64) -> Result<Self, ConfigError> {
        match value {
            -1 => Ok(WorkerCount::Auto),
            v if v >= 1 => Ok(WorkerCount::Fixed(usize::try_from(v).unwrap_or(usize::MAX))),
            v => Err(ConfigError::InvalidWorkers(v)),
        }
    }

    /// Effective worker count: at most twice the hardware parallelism.
    pub fn resolve(self, parallelism: NonZeroUsize) -> usize {
        let cap = parallelism.get().saturating_mul(2);
        match self {
            WorkerCount::Auto => cap,
            WorkerCount::Fixed(n) => n.clamp(1, cap),
        }
    }

    /// `resolve`, further limited to `jobs` (never below one): no point in
    /// more threads than there is work.
    pub fn resolve_for(self, jobs: usize, parallelism: NonZeroUsize) -> usize {
        self.resolve(parallelism).min(jobs.max(1))
    }

    /// `resolve` against this machine's available parallelism.
    pub fn resolve_local(self) -> usize {
        self.resolve(local_parallelism())
    }

    /// `resolve_for` against this machine's available parallelism.
    pub fn resolve_local_for(self, jobs: usize) -> usize {
        self.resolve_for(jobs, local_parallelism())
    }
}

fn local_parallelism() -> NonZeroUsize {
    std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN)
}

/// Validated configuration for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub mode: Mode,
    pub input: PathBuf,
    pub output_dir: PathBuf,
    /// Verify-mode report path.
    pub verify_log: PathBuf,
    pub min_size: u64,
    pub workers: WorkerCount,
    pub range: RunRange,
    pub http: HttpConfig,
    pub naming: NamingConfig,
    pub queue_capacity: Option<usize>,
}

impl RunConfig {
    /// Check the invariants that flag parsing cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath("input (--in)"));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath("output (--out)"));
        }
        if self.mode == Mode::Verify && self.verify_log.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath("log (--log)"));
        }
        if self.queue_capacity == Some(0) {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        Ok(())
    }
}

/// Convert the signed `--minsize` flag.
pub fn min_size_from_flag(value: i64) -> Result<u64, ConfigError> {
    u64::try_from(value).map_err(|_| ConfigError::NegativeMinSize(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nz(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn sample_run_config() -> RunConfig {
        RunConfig {
            mode: Mode::Download,
            input: PathBuf::from("catalog.geojson"),
            output_dir: PathBuf::from("/downloads"),
            verify_log: PathBuf::from("missing_or_small_files.log"),
            min_size: 10_000,
            workers: WorkerCount::Fixed(1),
            range: RunRange::all(),
            http: HttpConfig::default(),
            naming: NamingConfig::default(),
            queue_capacity: None,
        }
    }

    #[test]
    fn default_config_values() {
        let cfg = FileConfig::default();
        assert_eq!(cfg.http.connect_timeout_secs, 30);
        assert_eq!(cfg.http.low_speed_limit_bytes, 1024);
        assert_eq!(cfg.http.low_speed_time_secs, 60);
        assert!(cfg.http.timeout_secs.is_none());
        assert!(cfg.http.user_agent.starts_with("tilefetch/"));
        assert_eq!(cfg.naming.prefix, "dgm");
        assert_eq!(cfg.naming.extension, "xyz");
        assert!(cfg.queue_capacity.is_none());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = FileConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: FileConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn config_toml_partial_sections() {
        let toml = r#"
            queue_capacity = 8

            [http]
            user_agent = "Mozilla/5.0"
            timeout_secs = 600

            [naming]
            prefix = "bdom"
        "#;
        let cfg: FileConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.queue_capacity, Some(8));
        assert_eq!(cfg.http.user_agent, "Mozilla/5.0");
        assert_eq!(cfg.http.timeout_secs, Some(600));
        assert_eq!(cfg.http.connect_timeout_secs, 30);
        assert_eq!(cfg.naming.prefix, "bdom");
        assert_eq!(cfg.naming.extension, "xyz");
    }

    #[test]
    fn empty_toml_is_default() {
        let cfg: FileConfig = toml::from_str("").unwrap();
        assert_eq!(cfg, FileConfig::default());
    }

    #[test]
    fn load_explicit_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tilefetch.toml");
        fs::write(&path, "[naming]\nextension = \"tif\"\n").unwrap();
        let cfg = load_file_config(Some(&path)).unwrap();
        assert_eq!(cfg.naming.extension, "tif");
    }

    #[test]
    fn load_explicit_missing_or_broken_config_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("none.toml");
        assert!(matches!(load_file_config(Some(&missing)), Err(ConfigError::Read { .. })));

        let broken = dir.path().join("broken.toml");
        fs::write(&broken, "queue_capacity = \"lots\"").unwrap();
        assert!(matches!(load_file_config(Some(&broken)), Err(ConfigError::Toml { .. })));
    }

    #[test]
    fn worker_flag_parsing() {
        assert_eq!(WorkerCount::from_flag(-1).unwrap(), WorkerCount::Auto);
        assert_eq!(WorkerCount::from_flag(4).unwrap(), WorkerCount::Fixed(4));
        assert!(matches!(WorkerCount::from_flag(0), Err(ConfigError::InvalidWorkers(0))));
        assert!(matches!(WorkerCount::from_flag(-3), Err(ConfigError::InvalidWorkers(-3))));
    }

    #[test]
    fn worker_count_capped_at_twice_parallelism() {
        assert_eq!(WorkerCount::Auto.resolve(nz(4)), 8);
        assert_eq!(WorkerCount::Fixed(3).resolve(nz(4)), 3);
        assert_eq!(WorkerCount::Fixed(100).resolve(nz(4)), 8);
        assert_eq!(WorkerCount::Fixed(1).resolve(nz(1)), 1);
        assert!(WorkerCount::Auto.resolve_local() >= 2);
    }

    #[test]
    fn worker_count_limited_to_job_count() {
        assert_eq!(WorkerCount::Auto.resolve_for(3, nz(4)), 3);
        assert_eq!(WorkerCount::Fixed(6).resolve_for(2, nz(4)), 2);
        assert_eq!(WorkerCount::Fixed(2).resolve_for(50, nz(4)), 2);
        assert_eq!(WorkerCount::Auto.resolve_for(50, nz(4)), 8);
        // An empty run still gets one worker.
        assert_eq!(WorkerCount::Auto.resolve_for(0, nz(4)), 1);
        assert_eq!(WorkerCount::Fixed(5).resolve_local_for(1), 1);
    }

    #[test]
    fn min_size_flag() {
        assert_eq!(min_size_from_flag(10_000).unwrap(), 10_000);
        assert_eq!(min_size_from_flag(0).unwrap(), 0);
        assert!(matches!(min_size_from_flag(-1), Err(ConfigError::NegativeMinSize(-1))));
    }

    #[test]
    fn validate_rejects_empty_paths() {
        let cfg = sample_run_config();
        assert!(cfg.validate().is_ok());

        let mut no_input = sample_run_config();
        no_input.input = PathBuf::new();
        assert!(matches!(no_input.validate(), Err(ConfigError::EmptyPath(_))));

        let mut no_output = sample_run_config();
        no_output.output_dir = PathBuf::new();
        assert!(matches!(no_output.validate(), Err(ConfigError::EmptyPath(_))));

        let mut zero_queue = sample_run_config();
        zero_queue.queue_capacity = Some(0);
        assert!(matches!(zero_queue.validate(), Err(ConfigError::ZeroQueueCapacity)));
    }
}
