use std::fs;
use std::path::{Path, PathBuf};

use quartile_core::config::PipelineConfig;
use tracing::debug;

use crate::error::ConfigLoadError;
use crate::models::{Config, ConfigMetadata, LogConfig};
use crate::sources::{EnvConfig, FileConfig};
use crate::util::{duration_millis, parse_bool, parse_duration};
use crate::validation::{self, ConfigWarnings};

const DEFAULT_CONFIG_LOCATIONS: &[&str] = &["quartile.toml", "config/quartile.toml"];

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    /// Load `.env`, then resolve against the process environment.
    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path)
                .map(|_| true)
                .or_else(|err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                })?,
            None => dotenvy::dotenv().map(|_| true).or_else(|err| match err {
                dotenvy::Error::Io(_) => Ok(false),
                _ => Err(err),
            })?,
        };

        let mut load = self.load_with_env(EnvConfig::gather())?;
        load.config.metadata.env_file_loaded = env_file_loaded;
        Ok(load)
    }

    /// Resolve against an explicit environment snapshot.
    pub fn load_with_env(&self, env: EnvConfig) -> Result<ConfigLoad, ConfigLoadError> {
        let (file_config, config_path) = self.load_file_config(&env)?;
        let mut warnings = ConfigWarnings::default();
        if config_path.is_none() {
            warnings.push_with_hint(
                "No quartile.toml detected; using environment variables and defaults",
                "Pass --config or set QUARTILE_CONFIG to use a configuration file",
            );
        }

        let (pipeline, log) = compose(file_config.unwrap_or_default(), env)?;
        warnings.extend(validation::apply_guard_rails(&pipeline)?);

        Ok(ConfigLoad {
            config: Config {
                pipeline,
                log,
                metadata: ConfigMetadata {
                    config_path,
                    env_file_loaded: false,
                },
            },
            warnings,
        })
    }

    fn load_file_config(
        &self,
        env: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let (path, explicit) = match (&self.options.config_path, &env.config_path) {
            (Some(path), _) | (None, Some(path)) => (path.clone(), true),
            (None, None) => match DEFAULT_CONFIG_LOCATIONS
                .iter()
                .map(PathBuf::from)
                .find(|candidate| candidate.exists())
            {
                Some(path) => (path, false),
                None => return Ok((None, None)),
            },
        };

        if !path.exists() {
            if explicit {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            return Ok((None, None));
        }

        let file_config = read_file_config(&path)?;
        debug!(path = %path.display(), "loaded configuration file");
        Ok((Some(file_config), Some(path)))
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig, ConfigLoadError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Environment wins over the file, the file wins over defaults.
fn compose(file: FileConfig, env: EnvConfig) -> Result<(PipelineConfig, LogConfig), ConfigLoadError> {
    let FileConfig {
        queue: file_queue,
        browser: file_browser,
        extraction: file_extraction,
        output: file_output,
        log: file_log,
    } = file;
    let mut config = PipelineConfig::default();

    let queue = &mut config.queue;
    if let Some(url) = env.redis_url.or(file_queue.url) {
        queue.url = url;
    }
    if let Some(name) = env.queue_name.or(file_queue.name) {
        queue.name = name;
    }
    if let Some(consumer) = env.consumer.or(file_queue.consumer) {
        queue.consumer = consumer;
    }
    if let Some(ms) = millis("queue.poll_interval", env.poll_interval.or(file_queue.poll_interval))? {
        queue.poll_interval_ms = ms;
    }

    let browser = &mut config.browser;
    browser.binary_path = env.chrome_binary_path.or(file_browser.binary_path);
    match env.headless {
        Some(raw) => {
            browser.headless = parse_bool(&raw).ok_or(ConfigLoadError::InvalidValue {
                key: "QUARTILE_HEADLESS",
                value: raw,
                expected: "a boolean",
            })?;
        }
        None => {
            if let Some(headless) = file_browser.headless {
                browser.headless = headless;
            }
        }
    }
    if let Some(ms) = millis(
        "browser.launch_timeout",
        env.launch_timeout.or(file_browser.launch_timeout),
    )? {
        browser.launch_timeout_ms = ms;
    }

    let extraction = &mut config.extraction;
    if let Some(url) = env.search_url.or(file_extraction.search_url) {
        extraction.search_url = url;
    }
    if let Some(xpath) = file_extraction.control_xpath {
        extraction.control_xpath = xpath;
    }
    if let Some(xpath) = file_extraction.cell_xpath {
        extraction.cell_xpath = xpath;
    }
    if let Some(label) = env.category_label.or(file_extraction.category_label) {
        extraction.category_label = label;
    }
    if let Some(stride) = file_extraction.stride {
        extraction.stride = stride;
    }
    let wait = millis("QUARTILE_WAIT_TIMEOUT", env.wait_timeout)?;
    if let Some(ms) = wait.or(millis("extraction.control_timeout", file_extraction.control_timeout)?) {
        extraction.control_timeout_ms = ms;
    }
    if let Some(ms) = wait.or(millis("extraction.cells_timeout", file_extraction.cells_timeout)?) {
        extraction.cells_timeout_ms = ms;
    }
    if let Some(ms) = millis("extraction.poll_interval", file_extraction.poll_interval)? {
        extraction.poll_interval_ms = ms;
    }

    if let Some(dir) = env.output_dir.or(file_output.dir) {
        config.output.dir = dir;
    }

    let mut log = LogConfig::default();
    if let Some(level) = env.log_level.or(file_log.level) {
        log.level = level;
    }

    Ok((config, log))
}

fn millis(key: &'static str, raw: Option<String>) -> Result<Option<u64>, ConfigLoadError> {
    raw.map(|value| {
        parse_duration(&value)
            .map(duration_millis)
            .map_err(|source| ConfigLoadError::InvalidDuration { key, value, source })
    })
    .transpose()
}
