//! Quartile table extraction.
//!
//! The search page only renders the per-year table after the journal link
//! is clicked. The table is then read as one flat list of `<td>` cells and
//! scanned row by row: a row whose first cell names the configured subject
//! area contributes `year -> quartile` from its second and third cells.
//!
//! This is positional on purpose. If the site changes its column layout the
//! markers and stride are configuration, not code.

use std::time::Duration;

use tokio::time::{sleep, timeout};
use tracing::{debug, trace, warn};

use crate::config::ExtractionConfig;
use crate::render::{Locator, RenderError, RenderSession};
use crate::types::{ExtractionResult, Identifier};

/// Scan `cells` in rows of `stride`, keeping rows whose first cell contains `label`.
///
/// Incomplete trailing rows are ignored.
pub fn scan_cells<S: AsRef<str>>(cells: &[S], label: &str, stride: usize) -> ExtractionResult {
    let mut result = ExtractionResult::new();
    for row in cells.chunks(stride.max(1)) {
        let [head, year, value, ..] = row else {
            continue;
        };
        if head.as_ref().contains(label) {
            result.insert(year.as_ref().trim(), value.as_ref().trim());
        }
    }
    result
}

#[derive(Clone, Debug)]
pub struct ExtractionRule {
    control: Locator,
    cells: Locator,
    category_label: String,
    stride: usize,
    control_timeout: Duration,
    cells_timeout: Duration,
    poll_interval: Duration,
}

impl ExtractionRule {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            control: Locator::xpath(&config.control_xpath),
            cells: Locator::xpath(&config.cell_xpath),
            category_label: config.category_label.clone(),
            stride: config.stride,
            control_timeout: config.control_timeout(),
            cells_timeout: config.cells_timeout(),
            poll_interval: config.poll_interval(),
        }
    }

    /// Extract the mapping from a loaded page.
    ///
    /// Never fails: timeouts and lookup errors are logged against `identifier`
    /// and yield an empty mapping.
    pub async fn extract<S: RenderSession>(
        &self,
        session: &S,
        identifier: &Identifier,
    ) -> ExtractionResult {
        match self.try_extract(session).await {
            Ok(result) => {
                debug!(identifier = %identifier, entries = result.len(), "extracted quartiles");
                result
            }
            Err(err) => {
                warn!(identifier = %identifier, error = %err, "error extracting years and quartiles");
                ExtractionResult::new()
            }
        }
    }

    async fn try_extract<S: RenderSession>(
        &self,
        session: &S,
    ) -> Result<ExtractionResult, RenderError> {
        self.click_control(session).await?;
        let cells = self.wait_for_cells(session).await?;

        let mut texts = Vec::with_capacity(cells.len());
        for cell in &cells {
            texts.push(session.read_text(cell).await?);
        }
        trace!(cells = texts.len(), "read table cells");

        Ok(scan_cells(&texts, &self.category_label, self.stride))
    }

    /// Wait for the control to accept a click, then click it once.
    async fn click_control<S: RenderSession>(&self, session: &S) -> Result<(), RenderError> {
        let attempt = async {
            loop {
                match session.find_all(&self.control).await {
                    Ok(found) => {
                        if let Some(control) = found.first() {
                            match session.click(control).await {
                                Ok(()) => return,
                                Err(err) => trace!(error = %err, "control not interactable yet"),
                            }
                        }
                    }
                    Err(err) => trace!(error = %err, "control lookup failed"),
                }
                sleep(self.poll_interval).await;
            }
        };

        timeout(self.control_timeout, attempt)
            .await
            .map_err(|_| RenderError::Timeout {
                locator: self.control.to_string(),
                waited_ms: self.control_timeout.as_millis(),
            })
    }

    /// Wait until at least one cell is present and return all of them.
    async fn wait_for_cells<S: RenderSession>(
        &self,
        session: &S,
    ) -> Result<Vec<S::Element>, RenderError> {
        let attempt = async {
            loop {
                match session.find_all(&self.cells).await {
                    Ok(found) if !found.is_empty() => return found,
                    Ok(_) => {}
                    Err(err) => trace!(error = %err, "cell lookup failed"),
                }
                sleep(self.poll_interval).await;
            }
        };

        timeout(self.cells_timeout, attempt)
            .await
            .map_err(|_| RenderError::Timeout {
                locator: self.cells.to_string(),
                waited_ms: self.cells_timeout.as_millis(),
            })
    }
}
