//! Trace span type

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The role a span played in the traced operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SpanKind {
    /// Outbound request
    Client,
    /// Inbound request handling
    Server,
    /// Message published to a broker
    Producer,
    /// Message consumed from a broker
    Consumer,
}

/// One operation within a distributed trace
///
/// Identifiers are hex strings as produced by the caller's tracer; the sink
/// and transport never parse them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    /// Trace this span belongs to
    pub trace_id: String,

    /// Identifier of this span
    pub id: String,

    /// Identifier of the parent span, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    /// Operation name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Role of this span in the operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<SpanKind>,

    /// Start time in microseconds since the epoch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,

    /// Duration in microseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,

    /// Key/value annotations
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

impl Span {
    /// Create a span with the given trace and span identifiers
    pub fn new(trace_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            trace_id: trace_id.into(),
            id: id.into(),
            parent_id: None,
            name: None,
            kind: None,
            timestamp: None,
            duration: None,
            tags: BTreeMap::new(),
        }
    }

    /// Set the parent span identifier
    #[must_use]
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Set the operation name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the span kind
    #[must_use]
    pub fn with_kind(mut self, kind: SpanKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Set start time (microseconds since the epoch) and duration (microseconds)
    #[must_use]
    pub fn with_timing(mut self, timestamp: u64, duration: u64) -> Self {
        self.timestamp = Some(timestamp);
        self.duration = Some(duration);
        self
    }

    /// Add a tag
    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}
