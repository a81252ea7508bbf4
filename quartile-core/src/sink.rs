use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::types::{Identifier, OutputRecord};

const FILE_PREFIX: &str = "output_";
const FILE_EXT: &str = "json";

/// Writes one JSON file per identifier under a fixed directory.
///
/// Files are replaced atomically: the record is written to a temp file in the
/// same directory and renamed over the target, so a crash never leaves a
/// truncated record behind.
#[derive(Clone, Debug)]
pub struct ResultSink {
    dir: PathBuf,
}

impl ResultSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<dir>/output_<identifier>.json`.
    ///
    /// Path separators, NUL and `%` are percent-encoded, so distinct
    /// identifiers always map to distinct files.
    pub fn path_for(&self, identifier: &Identifier) -> PathBuf {
        self.dir
            .join(format!("{FILE_PREFIX}{}.{FILE_EXT}", file_stem(identifier)))
    }

    pub async fn write(&self, record: &OutputRecord) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| PipelineError::Sink {
                path: self.dir.clone(),
                source,
            })?;

        let bytes = render_record(record)?;
        let path = self.path_for(&record.identifier);
        let dir = self.dir.clone();
        let target = path.clone();

        tokio::task::spawn_blocking(move || replace_file(&dir, &target, &bytes))
            .await
            .map_err(|err| PipelineError::Sink {
                path: path.clone(),
                source: std::io::Error::other(err),
            })?
            .map_err(|source| PipelineError::Sink {
                path: path.clone(),
                source,
            })?;

        debug!(identifier = %record.identifier, path = %path.display(), "result written");
        Ok(path)
    }
}

fn file_stem(identifier: &Identifier) -> String {
    let raw = identifier.as_str();
    let mut stem = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '%' => stem.push_str("%25"),
            '/' => stem.push_str("%2F"),
            '\\' => stem.push_str("%5C"),
            '\0' => stem.push_str("%00"),
            other => stem.push(other),
        }
    }
    stem
}

fn render_record(record: &OutputRecord) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    record.serialize(&mut serializer)?;
    Ok(buf)
}

fn replace_file(dir: &Path, target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(target).map_err(|err| err.error)?;
    Ok(())
}
