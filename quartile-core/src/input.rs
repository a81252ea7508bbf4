//! Line-oriented identifier lists.

use std::path::Path;

use tracing::{error, info};

use crate::error::{PipelineError, Result};
use crate::types::Identifier;

/// Split `text` into identifiers, skipping blank lines and trimming the rest.
/// Input order is preserved and duplicates are kept.
pub fn parse_identifiers(text: &str) -> Vec<Identifier> {
    text.lines().filter_map(Identifier::parse).collect()
}

/// Read an identifier list, failing if the file cannot be opened.
pub async fn read_identifiers(path: &Path) -> Result<Vec<Identifier>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| PipelineError::Input {
            path: path.to_path_buf(),
            source,
        })?;
    let identifiers = parse_identifiers(&text);
    info!(path = %path.display(), count = identifiers.len(), "read identifier list");
    Ok(identifiers)
}

/// Read an identifier list, treating an unreadable file as an empty list.
pub async fn read_identifiers_or_empty(path: &Path) -> Vec<Identifier> {
    match read_identifiers(path).await {
        Ok(identifiers) => identifiers,
        Err(err) => {
            error!(path = %path.display(), error = %err, "input list unavailable");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_whitespace_lines_are_skipped() {
        let ids = parse_identifiers("1234-5678\n\n  \n9999-0000\n");
        let ids: Vec<&str> = ids.iter().map(Identifier::as_str).collect();
        assert_eq!(ids, vec!["1234-5678", "9999-0000"]);
    }

    #[test]
    fn duplicates_and_order_survive() {
        let ids = parse_identifiers(" b \r\na\nb");
        let ids: Vec<&str> = ids.iter().map(Identifier::as_str).collect();
        assert_eq!(ids, vec!["b", "a", "b"]);
    }

    #[tokio::test]
    async fn missing_file_fails_closed() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.txt");

        assert!(matches!(
            read_identifiers(&missing).await,
            Err(PipelineError::Input { .. })
        ));
        assert!(read_identifiers_or_empty(&missing).await.is_empty());
    }
}
