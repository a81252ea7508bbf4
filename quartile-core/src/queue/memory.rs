use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{QueueMessage, QueueTransport};
use crate::error::{PipelineError, Result};

#[derive(Debug, Default)]
struct State {
    ready: VecDeque<String>,
    inflight: Vec<QueueMessage>,
    acked: Vec<String>,
    requeued: usize,
    next_tag: u64,
    disconnected: bool,
}

/// In-process queue with the same settle semantics as the broker-backed one.
///
/// Used by tests and by single-host runs that never leave the process.
#[derive(Debug)]
pub struct MemoryQueue {
    name: String,
    prefetch: usize,
    state: Mutex<State>,
}

impl MemoryQueue {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefetch: 1,
            state: Mutex::new(State::default()),
        }
    }

    pub fn with_prefetch(mut self, prefetch: usize) -> Self {
        self.prefetch = prefetch.max(1);
        self
    }

    /// Seed ready messages without going through `publish`.
    pub fn seeded<I, S>(name: impl Into<String>, bodies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let queue = Self::new(name);
        if let Ok(mut state) = queue.state.lock() {
            state.ready.extend(bodies.into_iter().map(Into::into));
        }
        queue
    }

    /// Make every subsequent call fail as if the broker went away.
    pub fn disconnect(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.disconnected = true;
        }
    }

    pub fn ready(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|state| state.ready.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn inflight_len(&self) -> usize {
        self.state
            .lock()
            .map(|state| state.inflight.len())
            .unwrap_or_default()
    }

    /// Bodies acknowledged so far, in settle order.
    pub fn acked(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|state| state.acked.clone())
            .unwrap_or_default()
    }

    pub fn requeued(&self) -> usize {
        self.state
            .lock()
            .map(|state| state.requeued)
            .unwrap_or_default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut State) -> Result<T>) -> Result<T> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| PipelineError::Transport("memory queue state poisoned".into()))?;
        if state.disconnected {
            return Err(PipelineError::Transport(format!(
                "queue {} is disconnected",
                self.name
            )));
        }
        f(&mut state)
    }
}

fn take_inflight(state: &mut State, message: &QueueMessage) -> Result<QueueMessage> {
    let index = state
        .inflight
        .iter()
        .position(|pending| pending.tag == message.tag)
        .ok_or_else(|| {
            PipelineError::Transport(format!("delivery {} was not in flight", message.tag))
        })?;
    Ok(state.inflight.remove(index))
}

#[async_trait]
impl QueueTransport for MemoryQueue {
    fn name(&self) -> &str {
        &self.name
    }

    async fn declare(&self) -> Result<usize> {
        self.with_state(|state| Ok(state.ready.len()))
    }

    async fn publish(&self, body: &str) -> Result<()> {
        self.with_state(|state| {
            state.ready.push_back(body.to_string());
            Ok(())
        })
    }

    async fn recover(&self) -> Result<usize> {
        self.with_state(|state| {
            let recovered = state.inflight.len();
            for message in state.inflight.drain(..).rev() {
                state.ready.push_front(message.body);
            }
            Ok(recovered)
        })
    }

    async fn receive(&self) -> Result<Option<QueueMessage>> {
        let prefetch = self.prefetch;
        self.with_state(|state| {
            if state.inflight.len() >= prefetch {
                return Ok(None);
            }
            let Some(body) = state.ready.pop_front() else {
                return Ok(None);
            };
            let message = QueueMessage {
                body,
                tag: state.next_tag,
            };
            state.next_tag += 1;
            state.inflight.push(message.clone());
            Ok(Some(message))
        })
    }

    async fn ack(&self, message: &QueueMessage) -> Result<()> {
        self.with_state(|state| {
            let settled = take_inflight(state, message)?;
            state.acked.push(settled.body);
            Ok(())
        })
    }

    async fn requeue(&self, message: &QueueMessage) -> Result<()> {
        self.with_state(|state| {
            let settled = take_inflight(state, message)?;
            state.ready.push_front(settled.body);
            state.requeued += 1;
            Ok(())
        })
    }
}
