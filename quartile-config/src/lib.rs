//! Configuration loading for the quartile scraper.
//!
//! Values are layered, highest precedence first: process environment
//! (optionally seeded from a `.env` file), an optional TOML file, then the
//! built-in defaults from [`quartile_core::config`].

pub mod error;
pub mod loader;
pub mod models;
pub mod sources;
pub mod util;
pub mod validation;

pub use error::ConfigLoadError;
pub use loader::{ConfigLoad, ConfigLoader, ConfigLoaderOptions};
pub use models::{Config, ConfigMetadata, LogConfig};
pub use sources::{EnvConfig, FileConfig};
pub use validation::{ConfigGuardRailError, ConfigWarning, ConfigWarnings, Role, WarningScope};
