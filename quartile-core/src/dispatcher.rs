//! Binds a work source to a fixed number of fetch slots.
//!
//! Each slot owns at most one delivery at a time: it takes an item, runs the
//! fetch to completion, settles the delivery, and only then asks for the next
//! one. Completion order across slots is unspecified.

use std::fmt;
use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info_span};

use crate::error::{PipelineError, Result};
use crate::render::RenderEngine;
use crate::source::WorkSource;
use crate::types::Disposition;
use crate::worker::FetchWorker;

/// Per-disposition counts for one dispatcher run.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DispatchReport {
    pub acknowledged: usize,
    pub requeued: usize,
    pub abandoned: usize,
}

impl DispatchReport {
    fn record(&mut self, disposition: Disposition) {
        match disposition {
            Disposition::Acknowledge => self.acknowledged += 1,
            Disposition::Requeue => self.requeued += 1,
            Disposition::Abandon => self.abandoned += 1,
        }
    }

    fn merge(&mut self, other: DispatchReport) {
        self.acknowledged += other.acknowledged;
        self.requeued += other.requeued;
        self.abandoned += other.abandoned;
    }

    pub fn settled(&self) -> usize {
        self.acknowledged + self.requeued + self.abandoned
    }
}

pub struct Dispatcher<E: RenderEngine> {
    worker: Arc<FetchWorker<E>>,
    slots: usize,
    shutdown: CancellationToken,
}

impl<E: RenderEngine> fmt::Debug for Dispatcher<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("worker", &self.worker)
            .field("slots", &self.slots)
            .field("shutdown_cancelled", &self.shutdown.is_cancelled())
            .finish()
    }
}

impl<E: RenderEngine> Dispatcher<E> {
    /// `slots` is clamped to at least one.
    pub fn new(worker: Arc<FetchWorker<E>>, slots: usize, shutdown: CancellationToken) -> Self {
        Self {
            worker,
            slots: slots.max(1),
            shutdown,
        }
    }

    pub fn slots(&self) -> usize {
        self.slots
    }

    /// Drain `source` until it reports no more work or shutdown is requested.
    ///
    /// A source failure stops every slot and is returned; in-flight fetches
    /// on other slots are allowed to finish first.
    pub async fn run<S: WorkSource>(&self, source: Arc<S>) -> Result<DispatchReport> {
        // A failing slot stops its siblings without cancelling the caller.
        let stop = self.shutdown.child_token();
        let mut slots = JoinSet::new();

        for slot in 0..self.slots {
            let worker = Arc::clone(&self.worker);
            let source = Arc::clone(&source);
            let stop = stop.clone();
            slots.spawn(
                async move {
                    let result = run_slot(worker, source, stop.clone()).await;
                    if result.is_err() {
                        stop.cancel();
                    }
                    result
                }
                .instrument(info_span!("slot", slot)),
            );
        }

        let mut report = DispatchReport::default();
        let mut failure = None;
        while let Some(joined) = slots.join_next().await {
            match joined {
                Ok(Ok(slot_report)) => report.merge(slot_report),
                Ok(Err(err)) => {
                    stop.cancel();
                    failure.get_or_insert(err);
                }
                Err(join_err) => {
                    stop.cancel();
                    error!(error = %join_err, "dispatcher slot panicked");
                    failure.get_or_insert(PipelineError::Transport(format!(
                        "dispatcher slot failed: {join_err}"
                    )));
                }
            }
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(report),
        }
    }
}

async fn run_slot<E, S>(
    worker: Arc<FetchWorker<E>>,
    source: Arc<S>,
    stop: CancellationToken,
) -> Result<DispatchReport>
where
    E: RenderEngine,
    S: WorkSource,
{
    let mut report = DispatchReport::default();
    while let Some(delivery) = source.next(&stop).await? {
        let outcome = worker.fetch(&delivery.item).await;
        let disposition = source.complete(delivery, &outcome).await?;
        debug!(identifier = %outcome.identifier(), ?disposition, "delivery settled");
        report.record(disposition);
    }
    debug!(settled = report.settled(), "slot drained");
    Ok(report)
}
