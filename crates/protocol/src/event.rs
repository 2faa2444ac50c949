//! Structured event type

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A discrete occurrence worth recording alongside metrics
///
/// Events carry a type name, routing dimensions, and free-form properties.
/// Typical uses are deploy markers, alert state changes, and audit trails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event type name, e.g. `"deploy.finished"`
    pub event_type: String,

    /// Optional grouping category
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Dimensions identifying what the event happened to
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dimensions: BTreeMap<String, String>,

    /// Free-form key/value payload
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,

    /// Occurrence time in milliseconds since the epoch; `None` means the
    /// ingest service assigns the receive time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

impl Event {
    /// Create an event with the given type name
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            category: None,
            dimensions: BTreeMap::new(),
            properties: BTreeMap::new(),
            timestamp: None,
        }
    }

    /// Set the grouping category
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Add a dimension
    #[must_use]
    pub fn with_dimension(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.dimensions.insert(key.into(), value.into());
        self
    }

    /// Add a property
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Set the occurrence timestamp (milliseconds since the epoch)
    #[must_use]
    pub fn with_timestamp(mut self, millis: u64) -> Self {
        self.timestamp = Some(millis);
        self
    }
}
