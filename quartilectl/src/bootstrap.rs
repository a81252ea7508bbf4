use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use quartile_config::{Config, ConfigLoad, ConfigLoader, ConfigLoaderOptions, Role};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Flags every binary accepts.
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Path to a quartile.toml configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Path to a .env file loaded before reading the environment
    #[arg(long, value_name = "PATH")]
    pub env_file: Option<PathBuf>,
}

#[derive(Debug)]
pub struct RuntimeConfig {
    pub config: Config,
}

/// Load configuration, then install the process-wide subscriber.
///
/// `RUST_LOG` wins over the configured level. Queue client and browser
/// protocol chatter stays at `warn` unless asked for explicitly. Only the
/// warnings that concern `role` are logged.
pub fn load_runtime_config(args: &CommonArgs, role: Role) -> anyhow::Result<RuntimeConfig> {
    let ConfigLoad { config, warnings } = ConfigLoader::with_options(ConfigLoaderOptions {
        config_path: args.config.clone(),
        env_file: args.env_file.clone(),
    })
    .load()
    .context("failed to load configuration")?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            format!("{},redis=warn,chromiumoxide=warn", config.log.level).into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    if let Some(path) = &config.metadata.config_path {
        info!(path = %path.display(), "configuration file loaded");
    }
    for warning in warnings.for_role(role) {
        match &warning.hint {
            Some(hint) => warn!(hint = %hint, "configuration warning: {}", warning.message),
            None => warn!("configuration warning: {}", warning.message),
        }
    }

    Ok(RuntimeConfig { config })
}

/// Token cancelled on the first Ctrl-C.
pub fn shutdown_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("interrupt received; finishing in-flight work");
                trigger.cancel();
            }
            Err(err) => warn!(error = %err, "failed to listen for interrupt"),
        }
    });
    token
}
