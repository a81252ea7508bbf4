use std::collections::BTreeMap;
use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Opaque journal identifier read verbatim from one input line.
///
/// The only validation applied is that the trimmed value is non-empty.
/// Duplicates are allowed and are processed independently.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Trim `raw` and wrap it, rejecting blank input.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Unit of work handed to a fetch worker.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WorkItem {
    pub identifier: Identifier,
}

impl WorkItem {
    pub fn new(identifier: Identifier) -> Self {
        Self { identifier }
    }
}

impl From<Identifier> for WorkItem {
    fn from(identifier: Identifier) -> Self {
        Self::new(identifier)
    }
}

/// Year -> category value mapping scraped from one page.
///
/// Backed by a `BTreeMap` so serialized records are stable across runs.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractionResult(BTreeMap<String, String>);

impl ExtractionResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last write wins when a year repeats.
    pub fn insert(&mut self, year: impl Into<String>, value: impl Into<String>) {
        self.0.insert(year.into(), value.into());
    }

    pub fn get(&self, year: &str) -> Option<&str> {
        self.0.get(year).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ExtractionResult {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut result = Self::new();
        for (year, value) in iter {
            result.insert(year, value);
        }
        result
    }
}

/// One persisted record, serialized as `{ "<identifier>": { "<year>": "<value>" } }`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OutputRecord {
    pub identifier: Identifier,
    pub result: ExtractionResult,
}

impl OutputRecord {
    pub fn new(identifier: Identifier, result: ExtractionResult) -> Self {
        Self { identifier, result }
    }
}

impl Serialize for OutputRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.identifier.as_str(), &self.result)?;
        map.end()
    }
}

/// A work item together with the source-specific handle needed to settle it.
#[derive(Debug)]
pub struct Delivery<H> {
    pub item: WorkItem,
    pub handle: H,
}

/// How a source must settle a delivery once the worker is done with it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Disposition {
    /// The attempt completed (possibly with an empty result).
    Acknowledge,
    /// The attempt never started; hand the item back for redelivery.
    Requeue,
    /// The attempt never started and the source cannot redeliver.
    Abandon,
}
