// ABOUTME: Push/pull status records as emitted by the registry protocol.
// ABOUTME: Parses newline- or brace-delimited JSON object streams into records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One status object from a push/pull progress stream.
///
/// Records are open-ended maps; the accessors cover the keys the Docker
/// and Podman APIs actually send.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusRecord(Map<String, Value>);

impl StatusRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn status(&self) -> Option<&str> {
        self.get("status").and_then(Value::as_str)
    }

    /// Error text, if the runtime reported one inside the stream.
    pub fn error(&self) -> Option<&str> {
        self.get("error")
            .and_then(Value::as_str)
            .filter(|e| !e.is_empty())
            .or_else(|| {
                self.get("errorDetail")
                    .and_then(|d| d.get("message"))
                    .and_then(Value::as_str)
            })
    }

    /// Manifest digest, either top-level or inside the `aux` summary.
    pub fn digest(&self) -> Option<&str> {
        self.get("Digest")
            .or_else(|| self.get("aux").and_then(|aux| aux.get("Digest")))
            .or_else(|| self.get("manifestdigest"))
            .and_then(Value::as_str)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for StatusRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Parse a raw progress stream into ordered records.
///
/// Records may be separated by newlines, arbitrary whitespace, or nothing at
/// all (`}{`). An empty stream yields no records.
pub fn parse_status_stream(raw: &str) -> Result<Vec<StatusRecord>, serde_json::Error> {
    serde_json::Deserializer::from_str(raw)
        .into_iter::<StatusRecord>()
        .collect()
}
