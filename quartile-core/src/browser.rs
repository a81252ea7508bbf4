//! Browser binary resolution.
//!
//! An explicit path always wins. Without one, the documented per-platform
//! defaults are tried in order and the first that exists is used.

use std::path::PathBuf;

use crate::error::{PipelineError, Result};

/// Known install locations, keyed by `std::env::consts::OS`.
pub const PLATFORM_DEFAULTS: &[(&str, &str)] = &[
    (
        "windows",
        r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    ),
    ("linux", "/usr/bin/google-chrome-stable"),
    ("linux", "/usr/bin/chromium"),
    (
        "macos",
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    ),
];

pub fn platform_candidates(os: &str) -> Vec<PathBuf> {
    PLATFORM_DEFAULTS
        .iter()
        .filter(|(platform, _)| *platform == os)
        .map(|(_, path)| PathBuf::from(path))
        .collect()
}

#[derive(Clone, Debug)]
pub struct BinaryResolver {
    explicit: Option<PathBuf>,
    candidates: Vec<PathBuf>,
}

impl BinaryResolver {
    /// Resolver for the current platform.
    pub fn new(explicit: Option<PathBuf>) -> Self {
        Self::with_candidates(explicit, platform_candidates(std::env::consts::OS))
    }

    pub fn with_candidates(explicit: Option<PathBuf>, candidates: Vec<PathBuf>) -> Self {
        Self {
            explicit,
            candidates,
        }
    }

    /// Locate the browser binary or report a configuration failure.
    pub fn resolve(&self) -> Result<PathBuf> {
        if let Some(path) = &self.explicit {
            return if path.is_file() {
                Ok(path.clone())
            } else {
                Err(PipelineError::Configuration(format!(
                    "configured browser binary {} does not exist",
                    path.display()
                )))
            };
        }

        self.candidates
            .iter()
            .find(|candidate| candidate.is_file())
            .cloned()
            .ok_or_else(|| {
                PipelineError::Configuration(
                    "no browser binary configured and no platform default found; set CHROME_BINARY_PATH"
                        .to_string(),
                )
            })
    }
}
