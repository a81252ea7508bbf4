use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::{debug, warn};

use super::{RenderError, RenderSession};

/// Scoped owner of a rendering session.
///
/// Two cleanup paths:
/// 1. [`SessionGuard::release`] - awaited, reports shutdown failures.
/// 2. `Drop` - spawns termination on the runtime captured at construction,
///    covering early returns and panics that skip the explicit path.
///
/// Either way the session is terminated exactly once.
pub struct SessionGuard<S: RenderSession> {
    session: Arc<S>,
    label: String,
    released: bool,
    runtime: Option<Handle>,
}

impl<S: RenderSession> SessionGuard<S> {
    pub fn new(session: S, label: impl Into<String>) -> Self {
        Self {
            session: Arc::new(session),
            label: label.into(),
            released: false,
            runtime: Handle::try_current().ok(),
        }
    }

    /// Terminate the session now, consuming the guard.
    pub async fn release(mut self) -> Result<(), RenderError> {
        self.released = true;
        match self.session.terminate().await {
            Ok(()) => {
                debug!(session = %self.label, "rendering session released");
                Ok(())
            }
            Err(err) => {
                warn!(session = %self.label, error = %err, "rendering session did not shut down cleanly");
                Err(err)
            }
        }
    }
}

impl<S: RenderSession> Deref for SessionGuard<S> {
    type Target = S;

    fn deref(&self) -> &Self::Target {
        &self.session
    }
}

impl<S: RenderSession> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let session = Arc::clone(&self.session);
        let label = std::mem::take(&mut self.label);
        match &self.runtime {
            Some(runtime) => {
                runtime.spawn(async move {
                    if let Err(err) = session.terminate().await {
                        warn!(session = %label, error = %err, "drop cleanup of rendering session failed");
                    } else {
                        debug!(session = %label, "rendering session released on drop");
                    }
                });
            }
            None => {
                warn!(session = %label, "no runtime available; dropping rendering session without shutdown");
            }
        }
    }
}

impl<S: RenderSession> fmt::Debug for SessionGuard<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionGuard")
            .field("label", &self.label)
            .field("released", &self.released)
            .finish()
    }
}
