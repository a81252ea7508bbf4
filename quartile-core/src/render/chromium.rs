use std::fmt;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::{Browser, Element, Page};
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use super::{Locator, RenderEngine, RenderError, RenderSession};
use crate::config::BrowserConfig;

/// Launches one Chromium process per session over the DevTools protocol.
#[derive(Clone, Debug)]
pub struct ChromiumEngine {
    headless: bool,
    launch_timeout: Duration,
}

impl ChromiumEngine {
    pub fn new(config: &BrowserConfig) -> Self {
        Self {
            headless: config.headless,
            launch_timeout: config.launch_timeout(),
        }
    }
}

#[async_trait]
impl RenderEngine for ChromiumEngine {
    type Session = ChromiumSession;

    async fn start(&self, binary: &Path) -> Result<Self::Session, RenderError> {
        let mut builder = chromiumoxide::BrowserConfig::builder()
            .chrome_executable(binary)
            .launch_timeout(self.launch_timeout);
        if !self.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(RenderError::Launch)?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|err| RenderError::Launch(err.to_string()))?;

        // The handler drives the CDP connection and must be polled for the
        // lifetime of the browser.
        let events = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    trace!(error = %err, "cdp handler event error");
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(err) => {
                if let Err(close_err) = browser.close().await {
                    warn!(error = %close_err, "failed to close browser after page creation error");
                }
                if let Err(wait_err) = browser.wait().await {
                    warn!(error = %wait_err, "failed to reap browser process after page creation error");
                }
                events.abort();
                return Err(RenderError::Launch(err.to_string()));
            }
        };

        debug!(binary = %binary.display(), headless = self.headless, "browser launched");
        Ok(ChromiumSession {
            browser: Mutex::new(browser),
            page,
            events,
        })
    }
}

pub struct ChromiumSession {
    browser: Mutex<Browser>,
    page: Page,
    events: JoinHandle<()>,
}

impl fmt::Debug for ChromiumSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChromiumSession")
            .field("browser", &"Browser")
            .field("events_finished", &self.events.is_finished())
            .finish()
    }
}

#[async_trait]
impl RenderSession for ChromiumSession {
    type Element = Element;

    async fn navigate(&self, url: &str) -> Result<(), RenderError> {
        self.page
            .goto(url)
            .await
            .map(|_| ())
            .map_err(|err| RenderError::Navigation {
                url: url.to_string(),
                message: err.to_string(),
            })
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<Element>, RenderError> {
        self.page
            .find_xpaths(locator.as_str())
            .await
            .map_err(|err| RenderError::Query {
                locator: locator.to_string(),
                message: err.to_string(),
            })
    }

    async fn click(&self, element: &Element) -> Result<(), RenderError> {
        element
            .click()
            .await
            .map(|_| ())
            .map_err(|err| RenderError::Interaction(err.to_string()))
    }

    async fn read_text(&self, element: &Element) -> Result<String, RenderError> {
        element
            .inner_text()
            .await
            .map(Option::unwrap_or_default)
            .map_err(|err| RenderError::Interaction(err.to_string()))
    }

    async fn terminate(&self) -> Result<(), RenderError> {
        let mut browser = self.browser.lock().await;

        let closed = browser
            .close()
            .await
            .map(|_| ())
            .map_err(|err| RenderError::Shutdown(err.to_string()));
        if closed.is_err()
            && let Some(Err(err)) = browser.kill().await
        {
            warn!(error = %err, "failed to kill browser process");
        }
        if let Err(err) = browser.wait().await {
            warn!(error = %err, "failed to reap browser process");
        }
        self.events.abort();
        closed
    }
}
