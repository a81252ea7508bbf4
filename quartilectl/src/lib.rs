//! Process bootstrap shared by the quartile binaries.

pub mod bootstrap;

pub use bootstrap::{CommonArgs, RuntimeConfig, load_runtime_config, shutdown_on_ctrl_c};
