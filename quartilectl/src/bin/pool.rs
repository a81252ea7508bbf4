use std::path::PathBuf;

use clap::Parser;
use quartile_config::Role;
use quartile_core::{pipeline::run_pool, render::ChromiumEngine, worker::FetchWorker};
use quartilectl::{CommonArgs, load_runtime_config, shutdown_on_ctrl_c};
use tracing::error;

/// Fetch every journal number of an input list with parallel browser sessions
#[derive(Parser, Debug)]
#[command(name = "quartile-pool", version)]
struct Cli {
    /// File with one journal number per line
    input: PathBuf,

    /// Number of parallel browser sessions (at least one is used)
    workers: usize,

    #[command(flatten)]
    common: CommonArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let runtime = load_runtime_config(&cli.common, Role::Pool)?;
    let pipeline = &runtime.config.pipeline;

    let worker = FetchWorker::from_config(ChromiumEngine::new(&pipeline.browser), pipeline);
    if let Err(err) = run_pool(worker, &cli.input, cli.workers, shutdown_on_ctrl_c()).await {
        error!(error = %err, kind = err.kind(), "pool run failed");
    }
    Ok(())
}
