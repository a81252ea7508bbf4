use std::fmt;
use std::path::PathBuf;

use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::browser::BinaryResolver;
use crate::config::{IDENTIFIER_PLACEHOLDER, PipelineConfig};
use crate::error::PipelineError;
use crate::extract::ExtractionRule;
use crate::render::{RenderEngine, RenderSession, SessionGuard};
use crate::sink::ResultSink;
use crate::types::{ExtractionResult, Identifier, OutputRecord, WorkItem};

/// Search URL with the identifier spliced in verbatim.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SearchTemplate(String);

impl SearchTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn url_for(&self, identifier: &Identifier) -> String {
        self.0.replace(IDENTIFIER_PLACEHOLDER, identifier.as_str())
    }
}

/// Result of one fetch attempt.
#[derive(Debug)]
pub enum FetchOutcome {
    /// A record was written; `entries` may be zero.
    Completed {
        identifier: Identifier,
        path: PathBuf,
        entries: usize,
    },
    /// The attempt ran but produced no record (launch or write failure).
    Failed {
        identifier: Identifier,
        error: PipelineError,
    },
    /// The attempt was aborted before a session was opened.
    Misconfigured {
        identifier: Identifier,
        error: PipelineError,
    },
}

impl FetchOutcome {
    pub fn identifier(&self) -> &Identifier {
        match self {
            FetchOutcome::Completed { identifier, .. }
            | FetchOutcome::Failed { identifier, .. }
            | FetchOutcome::Misconfigured { identifier, .. } => identifier,
        }
    }

    /// Whether a rendering session was attempted at all.
    pub fn attempted(&self) -> bool {
        !matches!(self, FetchOutcome::Misconfigured { .. })
    }
}

/// Fetches one identifier end to end with a dedicated, short-lived session.
pub struct FetchWorker<E: RenderEngine> {
    engine: E,
    resolver: BinaryResolver,
    rule: ExtractionRule,
    sink: ResultSink,
    search: SearchTemplate,
}

impl<E: RenderEngine> fmt::Debug for FetchWorker<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchWorker")
            .field("engine", &std::any::type_name::<E>())
            .field("resolver", &self.resolver)
            .field("rule", &self.rule)
            .field("sink", &self.sink)
            .field("search", &self.search)
            .finish()
    }
}

impl<E: RenderEngine> FetchWorker<E> {
    pub fn new(
        engine: E,
        resolver: BinaryResolver,
        rule: ExtractionRule,
        sink: ResultSink,
        search: SearchTemplate,
    ) -> Self {
        Self {
            engine,
            resolver,
            rule,
            sink,
            search,
        }
    }

    pub fn from_config(engine: E, config: &PipelineConfig) -> Self {
        Self::new(
            engine,
            BinaryResolver::new(config.browser.binary_path.clone()),
            ExtractionRule::new(&config.extraction),
            ResultSink::new(config.output.dir.clone()),
            SearchTemplate::new(config.extraction.search_url.clone()),
        )
    }

    pub fn sink(&self) -> &ResultSink {
        &self.sink
    }

    pub async fn fetch(&self, item: &WorkItem) -> FetchOutcome {
        let span = info_span!("fetch", identifier = %item.identifier);
        self.fetch_inner(item.identifier.clone())
            .instrument(span)
            .await
    }

    async fn fetch_inner(&self, identifier: Identifier) -> FetchOutcome {
        info!("processing journal number");

        let binary = match self.resolver.resolve() {
            Ok(binary) => binary,
            Err(error) => {
                error!(error = %error, "cannot start rendering session");
                return FetchOutcome::Misconfigured { identifier, error };
            }
        };
        debug!(binary = %binary.display(), "using browser binary");

        let session = match self.engine.start(&binary).await {
            Ok(session) => SessionGuard::new(session, identifier.to_string()),
            Err(err) => {
                error!(error = %err, "failed to start rendering session");
                return FetchOutcome::Failed {
                    identifier,
                    error: err.into(),
                };
            }
        };

        let result = self.load_and_extract(&*session, &identifier).await;
        let entries = result.len();
        let written = self
            .sink
            .write(&OutputRecord::new(identifier.clone(), result))
            .await;

        // Failures are logged by the guard; the record is already settled.
        let _ = session.release().await;

        match written {
            Ok(path) => {
                info!(path = %path.display(), entries, "finished processing; results saved");
                FetchOutcome::Completed {
                    identifier,
                    path,
                    entries,
                }
            }
            Err(error) => {
                error!(error = %error, "failed to persist result");
                FetchOutcome::Failed { identifier, error }
            }
        }
    }

    async fn load_and_extract<S: RenderSession>(
        &self,
        session: &S,
        identifier: &Identifier,
    ) -> ExtractionResult {
        let url = self.search.url_for(identifier);
        match session.navigate(&url).await {
            Ok(()) => self.rule.extract(session, identifier).await,
            Err(err) => {
                let error = PipelineError::Navigation(err.to_string());
                warn!(error = %error, url = %url, "page load failed; recording empty result");
                ExtractionResult::new()
            }
        }
    }
}
