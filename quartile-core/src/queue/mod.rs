//! Queue transport seam.
//!
//! The pipeline relies on four primitives only: publish, receive with a
//! bounded number of unsettled deliveries (prefetch), acknowledge and
//! requeue. Replication and persistence belong to the broker.

mod memory;
mod redis_list;

use async_trait::async_trait;

use crate::error::Result;

pub use memory::MemoryQueue;
pub use redis_list::RedisQueue;

/// One delivery. `tag` is unique per delivery, not per body.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct QueueMessage {
    pub body: String,
    pub tag: u64,
}

#[async_trait]
pub trait QueueTransport: Send + Sync + 'static {
    fn name(&self) -> &str;

    /// Ensure the queue exists and report how many messages are ready.
    async fn declare(&self) -> Result<usize>;

    async fn publish(&self, body: &str) -> Result<()>;

    /// Return deliveries a previous run of this consumer never settled.
    async fn recover(&self) -> Result<usize>;

    /// Take the next ready message without waiting.
    ///
    /// Yields `None` when the queue is empty or the prefetch window is full.
    async fn receive(&self) -> Result<Option<QueueMessage>>;

    async fn ack(&self, message: &QueueMessage) -> Result<()>;

    /// Put an unsettled delivery back at the head of the queue.
    async fn requeue(&self, message: &QueueMessage) -> Result<()>;
}

#[async_trait]
impl<T: QueueTransport + ?Sized> QueueTransport for std::sync::Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn declare(&self) -> Result<usize> {
        (**self).declare().await
    }

    async fn publish(&self, body: &str) -> Result<()> {
        (**self).publish(body).await
    }

    async fn recover(&self) -> Result<usize> {
        (**self).recover().await
    }

    async fn receive(&self) -> Result<Option<QueueMessage>> {
        (**self).receive().await
    }

    async fn ack(&self, message: &QueueMessage) -> Result<()> {
        (**self).ack(message).await
    }

    async fn requeue(&self, message: &QueueMessage) -> Result<()> {
        (**self).requeue(message).await
    }
}
