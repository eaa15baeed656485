//! Wire types for the chain RPC interface.
//!
//! These mirror the JSON shapes returned by the fullnode: paginated event
//! queries, transaction blocks, and object reads. Field names follow the
//! RPC's camelCase convention via serde renames.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Position of an event within the global event log.
///
/// A transaction digest plus the event's sequence number inside that
/// transaction. Doubles as the pagination cursor for event queries and as
/// the persisted resumption point for a stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventId {
    pub tx_digest: String,
    pub event_seq: String,
}

impl EventId {
    #[must_use]
    pub fn new(tx_digest: impl Into<String>, event_seq: impl Into<String>) -> Self {
        Self {
            tx_digest: tx_digest.into(),
            event_seq: event_seq.into(),
        }
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.tx_digest, self.event_seq)
    }
}

/// A single emitted event as returned by the RPC.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Position of the event, used for cursor advancement.
    pub id: EventId,

    /// Fully-qualified event type, e.g. `0xabc::task_manager::TaskCreated`.
    #[serde(rename = "type")]
    pub event_type: String,

    /// Decoded Move event payload.
    #[serde(default)]
    pub parsed_json: Value,

    /// Emission timestamp in milliseconds, as a decimal string.
    #[serde(default)]
    pub timestamp_ms: Option<String>,

    /// Address that sent the source transaction.
    #[serde(default)]
    pub sender: Option<String>,
}

impl Event {
    /// Returns the emission timestamp, or `"0"` when the node omitted it.
    #[must_use]
    pub fn timestamp(&self) -> String {
        self.timestamp_ms.clone().unwrap_or_else(|| "0".to_string())
    }
}

/// One page of an event query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPage {
    pub data: Vec<Event>,
    pub has_next_page: bool,
    #[serde(default)]
    pub next_cursor: Option<EventId>,
}

/// Server-side filter selecting events emitted by one Move module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFilter {
    pub package: String,
    pub module: String,
}

impl EventFilter {
    #[must_use]
    pub fn module(package: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            module: module.into(),
        }
    }

    /// Renders the filter as the RPC's query parameter.
    #[must_use]
    pub fn to_query(&self) -> Value {
        json!({
            "MoveModule": {
                "package": self.package,
                "module": self.module,
            }
        })
    }
}

/// A transaction block with its emitted events.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionBlock {
    pub digest: String,
    #[serde(default)]
    pub timestamp_ms: Option<String>,
    #[serde(default)]
    pub events: Vec<Event>,
}

/// Response envelope for an object read.
///
/// The RPC reports missing or deleted objects through the `error` field
/// rather than a transport failure, so both sides are modeled.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectResponse {
    #[serde(default)]
    pub data: Option<ObjectData>,
    #[serde(default)]
    pub error: Option<Value>,
}

/// Object payload with display metadata and content fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectData {
    pub object_id: String,
    #[serde(default)]
    pub display: Option<Value>,
    #[serde(default)]
    pub content: Option<Value>,
}

impl ObjectResponse {
    /// Extracts a display image URL with a fixed fallback chain:
    /// display metadata, then known content field names, then empty string.
    #[must_use]
    pub fn display_image_url(&self) -> String {
        let Some(data) = &self.data else {
            return String::new();
        };

        if let Some(url) = data
            .display
            .as_ref()
            .and_then(|d| d.get("data"))
            .and_then(|d| d.get("image_url"))
            .and_then(Value::as_str)
        {
            return url.to_string();
        }

        let fields = data.content.as_ref().and_then(|c| c.get("fields"));
        if let Some(fields) = fields {
            for key in ["url", "image_url", "img_url"] {
                if let Some(url) = fields.get(key).and_then(Value::as_str) {
                    return url.to_string();
                }
            }
        }

        String::new()
    }
}
