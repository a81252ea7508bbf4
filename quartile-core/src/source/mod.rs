//! Work sources: where work items come from and how they are settled.
//!
//! The dispatcher is written once against [`WorkSource`]. The pool variant
//! reads the input list up front and cannot redeliver; the queue variant
//! pulls from a [`QueueTransport`](crate::queue::QueueTransport) and
//! settles each delivery with an ack or a requeue.

mod pool;
mod producer;
mod queue;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::types::{Delivery, Disposition};
use crate::worker::FetchOutcome;

pub use pool::PoolSource;
pub use producer::Producer;
pub use queue::QueueSource;

#[async_trait]
pub trait WorkSource: Send + Sync + 'static {
    /// Source-specific token needed to settle one delivery.
    type Handle: Send + 'static;

    /// Next work item, or `None` once the source is drained or `shutdown`
    /// fires.
    async fn next(&self, shutdown: &CancellationToken)
    -> Result<Option<Delivery<Self::Handle>>>;

    /// Settle a delivery. Called exactly once per delivery returned by `next`.
    async fn complete(
        &self,
        delivery: Delivery<Self::Handle>,
        outcome: &FetchOutcome,
    ) -> Result<Disposition>;
}
