use std::sync::Arc;

use clap::Parser;
use quartile_config::Role;
use quartile_core::{
    pipeline::run_consumer, queue::RedisQueue, render::ChromiumEngine, worker::FetchWorker,
};
use quartilectl::{CommonArgs, load_runtime_config, shutdown_on_ctrl_c};
use tracing::error;

/// Drain the work queue, fetching one journal at a time
#[derive(Parser, Debug)]
#[command(name = "quartile-consumer", version)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let runtime = load_runtime_config(&cli.common, Role::Consumer)?;
    let pipeline = &runtime.config.pipeline;

    // Queue failures are logged; only argument errors exit non-zero.
    let queue = match RedisQueue::connect(&pipeline.queue).await {
        Ok(queue) => queue,
        Err(err) => {
            error!(error = %err, kind = err.kind(), "failed to connect to the queue");
            return Ok(());
        }
    };
    let worker = FetchWorker::from_config(ChromiumEngine::new(&pipeline.browser), pipeline);

    if let Err(err) = run_consumer(
        worker,
        Arc::new(queue),
        pipeline.queue.poll_interval(),
        shutdown_on_ctrl_c(),
    )
    .await
    {
        error!(error = %err, kind = err.kind(), "consumer stopped on a queue failure");
    }
    Ok(())
}
