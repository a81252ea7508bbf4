use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_SEARCH_URL: &str = "https://www.scimagojr.com/journalsearch.php?q={identifier}";
pub const IDENTIFIER_PLACEHOLDER: &str = "{identifier}";
pub const DEFAULT_CONTROL_XPATH: &str = r#"//*[contains(@class, "jrnlname")]"#;
pub const DEFAULT_CELL_XPATH: &str = r#"//*[contains(@class, "cell100x1")]//td"#;
pub const DEFAULT_CATEGORY_LABEL: &str = "Linguistics and Language";
pub const DEFAULT_STRIDE: usize = 3;
pub const DEFAULT_QUEUE_NAME: &str = "journal_queue";
pub const DEFAULT_CONSUMER: &str = "consumer-1";
pub const DEFAULT_OUTPUT_DIR: &str = "result";

/// Knobs for the whole pipeline.
///
/// All fields carry defaults that target the SCImago search page, so a
/// deployment only needs to override what differs.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PipelineConfig {
    pub extraction: ExtractionConfig,
    pub browser: BrowserConfig,
    pub queue: QueueConfig,
    pub output: OutputConfig,
}

/// Where and how to read the quartile table from a search result page.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Search URL with an `{identifier}` placeholder.
    pub search_url: String,
    /// Clickable journal link that reveals the data table.
    pub control_xpath: String,
    /// Flat list of table cells scanned in strides.
    pub cell_xpath: String,
    /// Subject-area label a stride's first cell must contain.
    pub category_label: String,
    /// Width of one table row in cells.
    pub stride: usize,
    pub control_timeout_ms: u64,
    pub cells_timeout_ms: u64,
    /// How often the page is re-queried while waiting for an element.
    pub poll_interval_ms: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            search_url: DEFAULT_SEARCH_URL.to_string(),
            control_xpath: DEFAULT_CONTROL_XPATH.to_string(),
            cell_xpath: DEFAULT_CELL_XPATH.to_string(),
            category_label: DEFAULT_CATEGORY_LABEL.to_string(),
            stride: DEFAULT_STRIDE,
            control_timeout_ms: 20_000,
            cells_timeout_ms: 20_000,
            poll_interval_ms: 250,
        }
    }
}

impl ExtractionConfig {
    pub fn control_timeout(&self) -> Duration {
        Duration::from_millis(self.control_timeout_ms)
    }

    pub fn cells_timeout(&self) -> Duration {
        Duration::from_millis(self.cells_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

/// Rendering engine launch settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Explicit browser binary. When unset the platform default table is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binary_path: Option<PathBuf>,
    pub headless: bool,
    pub launch_timeout_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            binary_path: None,
            headless: true,
            launch_timeout_ms: 30_000,
        }
    }
}

impl BrowserConfig {
    pub fn launch_timeout(&self) -> Duration {
        Duration::from_millis(self.launch_timeout_ms)
    }
}

/// Durable queue connection settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub url: String,
    pub name: String,
    /// Names this consumer's in-flight list; must be unique per running consumer.
    pub consumer: String,
    /// Idle wait between polls while the queue has nothing to deliver.
    pub poll_interval_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            name: DEFAULT_QUEUE_NAME.to_string(),
            consumer: DEFAULT_CONSUMER.to_string(),
            poll_interval_ms: 500,
        }
    }
}

impl QueueConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}
