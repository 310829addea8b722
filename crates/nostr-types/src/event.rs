//! The NIP-01 event structure.
//!
//! Events arrive already validated (structure, id hash, signature) from the
//! ingestion path; this type is the immutable record the rest of the relay
//! operates on.

use serde::{Deserialize, Serialize};

/// A signed Nostr event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// 32-bytes lowercase hex-encoded sha256 of the serialized event data
    pub id: String,
    /// 32-bytes lowercase hex-encoded public key of the event creator
    pub pubkey: String,
    /// Unix timestamp in seconds
    pub created_at: u64,
    /// Event kind (integer between 0 and 65535)
    pub kind: u16,
    /// Array of arrays of strings (tags)
    pub tags: Vec<Vec<String>>,
    /// Arbitrary string content
    pub content: String,
    /// 64-bytes lowercase hex signature
    pub sig: String,
}

impl Event {
    /// Iterate the event's tags as `(name, value)` pairs.
    ///
    /// Tags with fewer than two elements carry no matchable value and are
    /// skipped; extra elements beyond the value (relay hints, markers) are
    /// ignored.
    pub fn tag_entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tags.iter().filter_map(|tag| match tag.as_slice() {
            [name, value, ..] => Some((name.as_str(), value.as_str())),
            _ => None,
        })
    }
}
