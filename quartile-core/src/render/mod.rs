//! Rendering-engine seam.
//!
//! The pipeline only needs a handful of operations from a browser: start a
//! session, load a URL, look elements up by a structural marker, click one
//! and read its text. [`RenderEngine`] and [`RenderSession`] capture exactly
//! that surface so the extraction rule can be exercised without a browser.

mod chromium;
mod guard;

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

pub use chromium::{ChromiumEngine, ChromiumSession};
pub use guard::SessionGuard;

/// Structural marker used to find elements (an XPath expression).
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Locator(String);

impl Locator {
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self(expr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("failed to load {url}: {message}")]
    Navigation { url: String, message: String },

    #[error("query {locator} failed: {message}")]
    Query { locator: String, message: String },

    #[error("interaction failed: {0}")]
    Interaction(String),

    #[error("timed out after {waited_ms}ms waiting for {locator}")]
    Timeout { locator: String, waited_ms: u128 },

    #[error("failed to shut browser down: {0}")]
    Shutdown(String),
}

/// Starts rendering sessions. One session serves exactly one fetch.
#[async_trait]
pub trait RenderEngine: Send + Sync + 'static {
    type Session: RenderSession;

    /// Launch a fresh session using the browser binary at `binary`.
    async fn start(&self, binary: &Path) -> Result<Self::Session, RenderError>;
}

/// A live page owned by one fetch.
#[async_trait]
pub trait RenderSession: Send + Sync + 'static {
    type Element: Send + Sync;

    async fn navigate(&self, url: &str) -> Result<(), RenderError>;

    /// All elements currently matching `locator`, in document order.
    async fn find_all(&self, locator: &Locator) -> Result<Vec<Self::Element>, RenderError>;

    async fn click(&self, element: &Self::Element) -> Result<(), RenderError>;

    async fn read_text(&self, element: &Self::Element) -> Result<String, RenderError>;

    /// Tear the session down. [`SessionGuard`] calls this exactly once.
    async fn terminate(&self) -> Result<(), RenderError>;
}
