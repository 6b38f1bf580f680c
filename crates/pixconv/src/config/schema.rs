use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// 10 MiB, the largest accepted upload.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,
    /// SQLite file for job records. `None` means the per-user default.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    #[serde(default)]
    pub segmentation: SegmentationConfig,
    #[serde(default)]
    pub logging: LogSettings,
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_worker_count() -> usize {
    num_cpus::get()
}

fn default_max_upload_bytes() -> usize {
    DEFAULT_MAX_UPLOAD_BYTES
}

fn default_max_dimension() -> u32 {
    crate::codec::DEFAULT_MAX_DIMENSION
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            worker_count: default_worker_count(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_dimension: default_max_dimension(),
            database_path: None,
            segmentation: SegmentationConfig::default(),
            logging: LogSettings::default(),
        }
    }
}

impl Config {
    /// Configured database path, or `~/.pixconv/data/pixconv.db`.
    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(crate::db::Database::default_path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SegmentationConfig {
    /// HTTP endpoint of the segmentation service. Background removal fails
    /// when unset.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_segmentation_timeout")]
    pub timeout_secs: u64,
    /// Name of the environment variable holding a bearer token.
    #[serde(default)]
    pub api_key_env: Option<String>,
}

fn default_segmentation_timeout() -> u64 {
    30
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: default_segmentation_timeout(),
            api_key_env: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::Text,
        }
    }
}
