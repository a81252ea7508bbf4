use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::WorkSource;
use crate::error::Result;
use crate::types::{Delivery, Disposition, Identifier, WorkItem};
use crate::worker::FetchOutcome;

/// In-process source over a fixed list of identifiers.
///
/// Every item is handed out exactly once. Nothing is redelivered: an item
/// whose fetch could not start is abandoned.
#[derive(Debug)]
pub struct PoolSource {
    pending: Mutex<VecDeque<WorkItem>>,
    total: usize,
}

impl PoolSource {
    pub fn new(identifiers: impl IntoIterator<Item = Identifier>) -> Self {
        let pending: VecDeque<WorkItem> = identifiers.into_iter().map(WorkItem::new).collect();
        let total = pending.len();
        Self {
            pending: Mutex::new(pending),
            total,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub async fn remaining(&self) -> usize {
        self.pending.lock().await.len()
    }
}

#[async_trait]
impl WorkSource for PoolSource {
    type Handle = ();

    async fn next(&self, shutdown: &CancellationToken) -> Result<Option<Delivery<()>>> {
        if shutdown.is_cancelled() {
            return Ok(None);
        }
        let item = self.pending.lock().await.pop_front();
        Ok(item.map(|item| Delivery { item, handle: () }))
    }

    async fn complete(&self, delivery: Delivery<()>, outcome: &FetchOutcome) -> Result<Disposition> {
        let identifier = &delivery.item.identifier;
        match outcome {
            FetchOutcome::Misconfigured { error, .. } => {
                warn!(identifier = %identifier, error = %error, "journal number abandoned");
                Ok(Disposition::Abandon)
            }
            FetchOutcome::Completed { .. } | FetchOutcome::Failed { .. } => {
                info!(identifier = %identifier, "Completed processing of journal number");
                Ok(Disposition::Acknowledge)
            }
        }
    }
}
