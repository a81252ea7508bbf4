//! Entry points shared by the producer, consumer and pool binaries.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::dispatcher::{DispatchReport, Dispatcher};
use crate::error::Result;
use crate::input::read_identifiers_or_empty;
use crate::queue::QueueTransport;
use crate::render::RenderEngine;
use crate::source::{PoolSource, Producer, QueueSource};
use crate::worker::FetchWorker;

/// Publish an input list to the queue behind `transport`.
pub async fn run_producer<T: QueueTransport>(transport: T, input: &Path) -> Result<usize> {
    let producer = Producer::new(transport);
    let published = producer.publish_file(input).await?;
    info!(queue = %producer.transport().name(), published, "closing queue connection");
    Ok(published)
}

/// Drain the queue with a single slot.
///
/// Unsettled deliveries from an earlier run are returned to the queue first.
/// If the queue is empty at that point the consumer exits without waiting;
/// otherwise it keeps taking deliveries until `shutdown` fires.
pub async fn run_consumer<E, T>(
    worker: FetchWorker<E>,
    transport: Arc<T>,
    poll_interval: Duration,
    shutdown: CancellationToken,
) -> Result<DispatchReport>
where
    E: RenderEngine,
    T: QueueTransport,
{
    transport.recover().await?;

    let waiting = transport.declare().await?;
    if waiting == 0 {
        info!(queue = %transport.name(), "Queue is empty. Shutting down...");
        return Ok(DispatchReport::default());
    }

    info!(queue = %transport.name(), waiting, "waiting for journal numbers; press CTRL+C to exit");
    let source = Arc::new(QueueSource::new(transport, poll_interval));
    let report = Dispatcher::new(Arc::new(worker), 1, shutdown)
        .run(source)
        .await?;
    info!(settled = report.settled(), "consumer stopped");
    Ok(report)
}

/// Process every identifier of `input` on `workers` parallel slots.
///
/// A missing input list is treated as empty.
pub async fn run_pool<E: RenderEngine>(
    worker: FetchWorker<E>,
    input: &Path,
    workers: usize,
    shutdown: CancellationToken,
) -> Result<DispatchReport> {
    info!(path = %input.display(), "Reading journal numbers from file");
    let identifiers = read_identifiers_or_empty(input).await;
    if identifiers.is_empty() {
        info!("No journal numbers found in the file");
        return Ok(DispatchReport::default());
    }

    let slots = workers.min(identifiers.len()).max(1);
    info!("Using {slots} active workers");

    let source = Arc::new(PoolSource::new(identifiers));
    let report = Dispatcher::new(Arc::new(worker), slots, shutdown)
        .run(source)
        .await?;
    info!(
        acknowledged = report.acknowledged,
        abandoned = report.abandoned,
        "All journal numbers processed"
    );
    Ok(report)
}
