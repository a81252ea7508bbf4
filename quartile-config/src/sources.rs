use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::util::non_empty;

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    #[serde(default)]
    pub queue: FileQueueConfig,
    #[serde(default)]
    pub browser: FileBrowserConfig,
    #[serde(default)]
    pub extraction: FileExtractionConfig,
    #[serde(default)]
    pub output: FileOutputConfig,
    #[serde(default)]
    pub log: FileLogConfig,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileQueueConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_interval: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileBrowserConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binary_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headless: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_timeout: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileExtractionConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_xpath: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell_xpath: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stride: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cells_timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_interval: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileOutputConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileLogConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

/// Environment-derived configuration values, kept raw until composition.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub redis_url: Option<String>,
    pub queue_name: Option<String>,
    pub consumer: Option<String>,
    pub poll_interval: Option<String>,
    pub chrome_binary_path: Option<PathBuf>,
    pub headless: Option<String>,
    pub launch_timeout: Option<String>,
    pub search_url: Option<String>,
    pub category_label: Option<String>,
    pub wait_timeout: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| non_empty(lookup(key));
        Self {
            config_path: var("QUARTILE_CONFIG").map(PathBuf::from),
            redis_url: var("REDIS_URL"),
            queue_name: var("QUARTILE_QUEUE"),
            consumer: var("QUARTILE_CONSUMER"),
            poll_interval: var("QUARTILE_POLL_INTERVAL"),
            chrome_binary_path: var("CHROME_BINARY_PATH").map(PathBuf::from),
            headless: var("QUARTILE_HEADLESS"),
            launch_timeout: var("QUARTILE_LAUNCH_TIMEOUT"),
            search_url: var("QUARTILE_SEARCH_URL"),
            category_label: var("QUARTILE_CATEGORY"),
            wait_timeout: var("QUARTILE_WAIT_TIMEOUT"),
            output_dir: var("QUARTILE_OUTPUT_DIR").map(PathBuf::from),
            log_level: var("QUARTILE_LOG"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_env_values_are_unset() {
        let env = EnvConfig::from_lookup(|key| match key {
            "CHROME_BINARY_PATH" => Some("  ".to_string()),
            "QUARTILE_QUEUE" => Some("journals".to_string()),
            _ => None,
        });
        assert!(env.chrome_binary_path.is_none());
        assert_eq!(env.queue_name.as_deref(), Some("journals"));
    }

    #[test]
    fn file_sections_are_optional() {
        let file: FileConfig = toml::from_str("[queue]\nname = \"journals\"\n").unwrap();
        assert_eq!(file.queue.name.as_deref(), Some("journals"));
        assert!(file.browser.binary_path.is_none());
        assert!(file.extraction.stride.is_none());
    }
}
