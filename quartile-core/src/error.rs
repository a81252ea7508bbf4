use std::path::PathBuf;

use thiserror::Error;

use crate::render::RenderError;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// The environment needed to start a rendering session is missing.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Navigation error: {0}")]
    Navigation(String),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Failed to read input list {path}: {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write result {path}: {source}")]
    Sink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PipelineError {
    /// Short machine-friendly label used in structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Configuration(_) => "configuration",
            PipelineError::Navigation(_) => "navigation",
            PipelineError::Render(_) => "render",
            PipelineError::Transport(_) => "transport",
            PipelineError::Input { .. } => "input",
            PipelineError::Sink { .. } => "sink",
            PipelineError::Serialization(_) => "serialization",
        }
    }
}

impl From<redis::RedisError> for PipelineError {
    fn from(err: redis::RedisError) -> Self {
        PipelineError::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
