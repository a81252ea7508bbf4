use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::input::read_identifiers;
use crate::queue::QueueTransport;

/// Publishes one message per identifier of an input list.
#[derive(Debug)]
pub struct Producer<T: QueueTransport> {
    transport: T,
}

impl<T: QueueTransport> Producer<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Publish every identifier in `path`, in file order.
    ///
    /// Stops at the first transport failure; nothing is retried.
    pub async fn publish_file(&self, path: &Path) -> Result<usize> {
        let identifiers = read_identifiers(path).await?;
        let waiting = self.transport.declare().await?;
        info!(
            queue = %self.transport.name(),
            waiting,
            identifiers = identifiers.len(),
            "publishing journal numbers"
        );

        for identifier in &identifiers {
            self.transport.publish(identifier.as_str()).await?;
            info!(identifier = %identifier, "sent {identifier} to queue");
        }
        Ok(identifiers.len())
    }

    pub fn into_inner(self) -> T {
        self.transport
    }
}
