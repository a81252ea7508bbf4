use quartile_core::config::{DEFAULT_CONSUMER, IDENTIFIER_PLACEHOLDER, PipelineConfig};
use thiserror::Error;
use url::Url;

/// The extraction rule reads positions 0, 1 and 2 of every stride.
pub const MIN_STRIDE: usize = 3;

#[derive(Debug, Error)]
pub enum ConfigGuardRailError {
    #[error("search URL must contain the {IDENTIFIER_PLACEHOLDER} placeholder")]
    MissingPlaceholder,
    #[error("search URL is not a valid URL: {reason}")]
    InvalidSearchUrl { reason: String },
    #[error("stride {stride} is narrower than the {MIN_STRIDE} cells each row needs")]
    StrideTooNarrow { stride: usize },
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
    #[error("queue URL {url} is not a redis:// URL")]
    InvalidQueueUrl { url: String },
}

/// The binary a configuration is loaded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Producer,
    Consumer,
    Pool,
}

/// Which roles a warning concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningScope {
    Any,
    /// Roles that launch a browser.
    Fetch,
    /// Roles that take deliveries off the queue.
    Consume,
}

impl WarningScope {
    pub fn covers(self, role: Role) -> bool {
        match self {
            WarningScope::Any => true,
            WarningScope::Fetch => matches!(role, Role::Consumer | Role::Pool),
            WarningScope::Consume => role == Role::Consumer,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
    pub scope: WarningScope,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.push_scoped(WarningScope::Any, message, None::<String>);
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(&mut self, message: S, hint: H) {
        self.push_scoped(WarningScope::Any, message, Some(hint));
    }

    pub fn push_scoped<S: Into<String>, H: Into<String>>(
        &mut self,
        scope: WarningScope,
        message: S,
        hint: Option<H>,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: hint.map(Into::into),
            scope,
        });
    }

    /// Warnings worth reporting to `role`.
    pub fn for_role(&self, role: Role) -> impl Iterator<Item = &ConfigWarning> {
        self.items.iter().filter(move |w| w.scope.covers(role))
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }
}

pub fn apply_guard_rails(config: &PipelineConfig) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();
    let extraction = &config.extraction;

    if !extraction.search_url.contains(IDENTIFIER_PLACEHOLDER) {
        return Err(ConfigGuardRailError::MissingPlaceholder);
    }
    let probe = extraction.search_url.replace(IDENTIFIER_PLACEHOLDER, "0000-0000");
    Url::parse(&probe).map_err(|err| ConfigGuardRailError::InvalidSearchUrl {
        reason: err.to_string(),
    })?;

    if extraction.stride < MIN_STRIDE {
        return Err(ConfigGuardRailError::StrideTooNarrow {
            stride: extraction.stride,
        });
    }

    for (field, value) in [
        ("extraction.control_xpath", &extraction.control_xpath),
        ("extraction.cell_xpath", &extraction.cell_xpath),
        ("extraction.category_label", &extraction.category_label),
        ("queue.name", &config.queue.name),
        ("queue.consumer", &config.queue.consumer),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigGuardRailError::Empty { field });
        }
    }

    match Url::parse(&config.queue.url) {
        Ok(url) if matches!(url.scheme(), "redis" | "rediss") => {}
        _ => {
            return Err(ConfigGuardRailError::InvalidQueueUrl {
                url: config.queue.url.clone(),
            });
        }
    }

    if config.browser.binary_path.is_none() {
        warnings.push_scoped(
            WarningScope::Fetch,
            "No browser binary configured; platform default locations will be probed",
            Some("Set CHROME_BINARY_PATH or browser.binary_path"),
        );
    }

    if !config.browser.headless {
        warnings.push_scoped(
            WarningScope::Fetch,
            "Browser runs with a visible window; expect one window per active worker",
            None::<String>,
        );
    }

    if extraction.control_timeout_ms == 0 || extraction.cells_timeout_ms == 0 {
        warnings.push_scoped(
            WarningScope::Fetch,
            "An extraction wait timeout is zero; every page will yield an empty result",
            Some("Set QUARTILE_WAIT_TIMEOUT to a few seconds"),
        );
    }

    // A consumer recovers its whole in-flight list on start-up, including
    // deliveries another live consumer of the same name still holds.
    if config.queue.consumer == DEFAULT_CONSUMER {
        warnings.push_scoped(
            WarningScope::Consume,
            format!(
                "Consumer name left at the default `{DEFAULT_CONSUMER}`; concurrent consumers must not share it"
            ),
            Some("Set QUARTILE_CONSUMER to a name unique to this instance"),
        );
    }

    Ok(warnings)
}
