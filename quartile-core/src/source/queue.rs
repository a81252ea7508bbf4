use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::WorkSource;
use crate::error::Result;
use crate::queue::{QueueMessage, QueueTransport};
use crate::types::{Delivery, Disposition, Identifier, WorkItem};
use crate::worker::FetchOutcome;

/// Durable source backed by a queue transport.
///
/// Waits for deliveries until shut down. Blank message bodies carry no
/// identifier and are acknowledged without being dispatched.
pub struct QueueSource<T: QueueTransport> {
    transport: Arc<T>,
    poll_interval: Duration,
}

impl<T: QueueTransport> std::fmt::Debug for QueueSource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueSource")
            .field("queue", &self.transport.name())
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

impl<T: QueueTransport> QueueSource<T> {
    pub fn new(transport: Arc<T>, poll_interval: Duration) -> Self {
        Self {
            transport,
            poll_interval,
        }
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }
}

pub(crate) fn disposition_for(outcome: &FetchOutcome) -> Disposition {
    match outcome {
        FetchOutcome::Misconfigured { .. } => Disposition::Requeue,
        FetchOutcome::Completed { .. } | FetchOutcome::Failed { .. } => Disposition::Acknowledge,
    }
}

#[async_trait]
impl<T: QueueTransport> WorkSource for QueueSource<T> {
    type Handle = QueueMessage;

    async fn next(&self, shutdown: &CancellationToken) -> Result<Option<Delivery<QueueMessage>>> {
        loop {
            if shutdown.is_cancelled() {
                return Ok(None);
            }

            match self.transport.receive().await? {
                Some(message) => match Identifier::parse(&message.body) {
                    Some(identifier) => {
                        info!(identifier = %identifier, tag = message.tag, "received journal number");
                        return Ok(Some(Delivery {
                            item: WorkItem::new(identifier),
                            handle: message,
                        }));
                    }
                    None => {
                        warn!(tag = message.tag, "discarding blank message");
                        self.transport.ack(&message).await?;
                    }
                },
                None => {
                    tokio::select! {
                        _ = shutdown.cancelled() => return Ok(None),
                        _ = tokio::time::sleep(self.poll_interval) => {}
                    }
                }
            }
        }
    }

    async fn complete(
        &self,
        delivery: Delivery<QueueMessage>,
        outcome: &FetchOutcome,
    ) -> Result<Disposition> {
        let message = delivery.handle;
        let disposition = disposition_for(outcome);
        match disposition {
            Disposition::Requeue => {
                warn!(
                    identifier = %delivery.item.identifier,
                    tag = message.tag,
                    "fetch could not start; requeueing delivery"
                );
                self.transport.requeue(&message).await?;
                // The same delivery comes straight back; don't spin on it.
                tokio::time::sleep(self.poll_interval).await;
            }
            Disposition::Acknowledge | Disposition::Abandon => {
                self.transport.ack(&message).await?;
                debug!(identifier = %delivery.item.identifier, tag = message.tag, "delivery acknowledged");
            }
        }
        Ok(disposition)
    }
}
