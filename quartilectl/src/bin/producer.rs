use std::path::PathBuf;

use clap::Parser;
use quartile_config::Role;
use quartile_core::{pipeline::run_producer, queue::RedisQueue};
use quartilectl::{CommonArgs, load_runtime_config};
use tracing::error;

/// Publish every journal number of an input list to the work queue
#[derive(Parser, Debug)]
#[command(name = "quartile-producer", version)]
struct Cli {
    /// File with one journal number per line
    input: PathBuf,

    #[command(flatten)]
    common: CommonArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let runtime = load_runtime_config(&cli.common, Role::Producer)?;
    let queue_config = &runtime.config.pipeline.queue;

    // Queue and input failures are logged; only argument errors exit non-zero.
    let queue = match RedisQueue::connect(queue_config).await {
        Ok(queue) => queue,
        Err(err) => {
            error!(error = %err, kind = err.kind(), "failed to connect to the queue");
            return Ok(());
        }
    };
    if let Err(err) = run_producer(queue, &cli.input).await {
        error!(error = %err, kind = err.kind(), "failed to publish journal numbers");
    }
    Ok(())
}
