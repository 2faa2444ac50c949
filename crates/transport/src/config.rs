//! Transport configuration

use std::time::Duration;

use crate::endpoint;

/// Default per-request timeout applied by the default HTTP client
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// User agent sent when no override is configured
pub const DEFAULT_USER_AGENT: &str = concat!("funnel/", env!("CARGO_PKG_VERSION"));

/// Endpoint, identity, and timeout knobs for a transport
///
/// `None` fields fall back to the library defaults in [`endpoint`] and this
/// module.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Override for the datapoint ingest URL
    pub datapoint_endpoint: Option<String>,

    /// Override for the event ingest URL
    pub event_endpoint: Option<String>,

    /// Override for the span ingest URL
    pub trace_endpoint: Option<String>,

    /// Override for the HTTP user agent
    pub user_agent: Option<String>,

    /// Per-request timeout
    pub request_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            datapoint_endpoint: None,
            event_endpoint: None,
            trace_endpoint: None,
            user_agent: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl TransportConfig {
    /// Set the datapoint ingest URL
    #[must_use]
    pub fn with_datapoint_endpoint(mut self, url: impl Into<String>) -> Self {
        self.datapoint_endpoint = Some(url.into());
        self
    }

    /// Set the event ingest URL
    #[must_use]
    pub fn with_event_endpoint(mut self, url: impl Into<String>) -> Self {
        self.event_endpoint = Some(url.into());
        self
    }

    /// Set the span ingest URL
    #[must_use]
    pub fn with_trace_endpoint(mut self, url: impl Into<String>) -> Self {
        self.trace_endpoint = Some(url.into());
        self
    }

    /// Set the HTTP user agent
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the per-request timeout
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Datapoint ingest URL after applying defaults
    pub fn datapoint_url(&self) -> String {
        self.datapoint_endpoint
            .clone()
            .unwrap_or_else(endpoint::datapoint_url)
    }

    /// Event ingest URL after applying defaults
    pub fn event_url(&self) -> String {
        self.event_endpoint
            .clone()
            .unwrap_or_else(endpoint::event_url)
    }

    /// Span ingest URL after applying defaults
    pub fn trace_url(&self) -> String {
        self.trace_endpoint
            .clone()
            .unwrap_or_else(endpoint::trace_url)
    }
}
