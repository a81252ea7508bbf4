use std::path::PathBuf;

use quartile_core::config::PipelineConfig;

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Fully resolved configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub pipeline: PipelineConfig,
    pub log: LogConfig,
    pub metadata: ConfigMetadata,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

/// Where the configuration came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}
