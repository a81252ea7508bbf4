use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use redis::{AsyncCommands, Direction, Script, aio::ConnectionManager};
use tracing::{debug, info};

use super::{QueueMessage, QueueTransport};
use crate::config::QueueConfig;
use crate::error::{PipelineError, Result};

/// Moves one copy of ARGV[1] from the in-flight list back to the queue head.
const REQUEUE_SCRIPT: &str = r#"
if redis.call('LREM', KEYS[1], 1, ARGV[1]) > 0 then
    return redis.call('LPUSH', KEYS[2], ARGV[1])
end
return 0
"#;

/// Reliable list queue on Redis.
///
/// Ready messages live in `<name>`. A delivery is moved atomically into this
/// consumer's `<name>:inflight:<consumer>` list and stays there until it is
/// acknowledged (removed) or requeued (pushed back to the head of `<name>`).
/// Whatever is left in the in-flight list after a crash is returned by
/// [`QueueTransport::recover`] on the next start.
pub struct RedisQueue {
    conn: ConnectionManager,
    name: String,
    inflight: String,
    prefetch: usize,
    next_tag: AtomicU64,
}

impl fmt::Debug for RedisQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisQueue")
            .field("connection", &"ConnectionManager")
            .field("name", &self.name)
            .field("inflight", &self.inflight)
            .field("prefetch", &self.prefetch)
            .finish()
    }
}

impl RedisQueue {
    pub async fn connect(config: &QueueConfig) -> Result<Self> {
        info!("Connecting to queue broker at {}", config.url);

        let client = redis::Client::open(config.url.as_str()).map_err(|e| {
            PipelineError::Transport(format!("Failed to create Redis client: {e}"))
        })?;

        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| PipelineError::Transport(format!("Failed to connect to Redis: {e}")))?;

        info!("Successfully connected to queue broker");

        Ok(Self {
            conn,
            name: config.name.clone(),
            inflight: format!("{}:inflight:{}", config.name, config.consumer),
            prefetch: 1,
            next_tag: AtomicU64::new(1),
        })
    }

    /// Allow up to `prefetch` unsettled deliveries for this consumer.
    pub fn with_prefetch(mut self, prefetch: usize) -> Self {
        self.prefetch = prefetch.max(1);
        self
    }
}

#[async_trait]
impl QueueTransport for RedisQueue {
    fn name(&self) -> &str {
        &self.name
    }

    async fn declare(&self) -> Result<usize> {
        // Lists exist implicitly; declaring is a length probe that also
        // proves the connection works.
        let mut conn = self.conn.clone();
        let ready: usize = conn.llen(&self.name).await?;
        debug!(queue = %self.name, ready, "queue declared");
        Ok(ready)
    }

    async fn publish(&self, body: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: usize = conn.rpush(&self.name, body).await?;
        Ok(())
    }

    async fn recover(&self) -> Result<usize> {
        let mut conn = self.conn.clone();
        let mut recovered = 0usize;
        loop {
            let moved: Option<String> = conn
                .lmove(&self.inflight, &self.name, Direction::Right, Direction::Left)
                .await?;
            match moved {
                Some(_) => recovered += 1,
                None => break,
            }
        }
        if recovered > 0 {
            info!(queue = %self.name, recovered, "returned unsettled deliveries to the queue");
        }
        Ok(recovered)
    }

    async fn receive(&self) -> Result<Option<QueueMessage>> {
        let mut conn = self.conn.clone();
        let outstanding: usize = conn.llen(&self.inflight).await?;
        if outstanding >= self.prefetch {
            return Ok(None);
        }

        let body: Option<String> = conn
            .lmove(&self.name, &self.inflight, Direction::Left, Direction::Right)
            .await?;
        Ok(body.map(|body| QueueMessage {
            body,
            tag: self.next_tag.fetch_add(1, Ordering::Relaxed),
        }))
    }

    async fn ack(&self, message: &QueueMessage) -> Result<()> {
        let mut conn = self.conn.clone();
        let removed: usize = conn.lrem(&self.inflight, 1, &message.body).await?;
        if removed == 0 {
            return Err(PipelineError::Transport(format!(
                "delivery {} was not in flight",
                message.tag
            )));
        }
        Ok(())
    }

    async fn requeue(&self, message: &QueueMessage) -> Result<()> {
        let mut conn = self.conn.clone();
        let pushed: usize = Script::new(REQUEUE_SCRIPT)
            .key(&self.inflight)
            .key(&self.name)
            .arg(&message.body)
            .invoke_async(&mut conn)
            .await?;
        if pushed == 0 {
            return Err(PipelineError::Transport(format!(
                "delivery {} was not in flight",
                message.tag
            )));
        }
        Ok(())
    }
}

impl Drop for RedisQueue {
    fn drop(&mut self) {
        debug!(queue = %self.name, "queue connection closed");
    }
}
