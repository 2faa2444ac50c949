//! Recording transport for tests
//!
//! Records every send and replays a scripted sequence of failures. An empty
//! script means every send succeeds.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use funnel_protocol::{Datapoint, Event, Span, Token};
use funnel_transport::{Transport, TransportError};

/// One observed transport call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// Record kind: "datapoint", "event", or "span"
    pub kind: &'static str,
    /// Token the batch was sent under
    pub token: String,
    /// Identifying field of each record, in batch order
    pub records: Vec<String>,
}

#[derive(Clone, Default)]
pub struct RecordingTransport {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    script: Arc<Mutex<VecDeque<TransportError>>>,
    delay: Option<Duration>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport whose every send stalls for `delay` before answering
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Queue an error for the next unanswered send
    pub fn fail_next(&self, err: TransportError) {
        self.script.lock().unwrap().push_back(err);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    async fn send(
        &self,
        kind: &'static str,
        token: &Token,
        records: Vec<String>,
    ) -> Result<(), TransportError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.calls.lock().unwrap().push(RecordedCall {
            kind,
            token: token.as_str().to_string(),
            records,
        });
        match self.script.lock().unwrap().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Transport<Datapoint> for RecordingTransport {
    async fn send_batch(&self, token: &Token, batch: &[Datapoint]) -> Result<(), TransportError> {
        let records = batch.iter().map(|dp| dp.metric.clone()).collect();
        self.send("datapoint", token, records).await
    }
}

#[async_trait]
impl Transport<Event> for RecordingTransport {
    async fn send_batch(&self, token: &Token, batch: &[Event]) -> Result<(), TransportError> {
        let records = batch.iter().map(|ev| ev.event_type.clone()).collect();
        self.send("event", token, records).await
    }
}

#[async_trait]
impl Transport<Span> for RecordingTransport {
    async fn send_batch(&self, token: &Token, batch: &[Span]) -> Result<(), TransportError> {
        let records = batch.iter().map(|span| span.id.clone()).collect();
        self.send("span", token, records).await
    }
}

/// Shorthand: an API error with the given status
pub fn api_error(status: u16) -> TransportError {
    TransportError::Api {
        status,
        message: String::new(),
    }
}

/// Shorthand: a rate-limit error wrapping a 429 response
pub fn rate_limit_error() -> TransportError {
    TransportError::TooManyRequests {
        retry_after: Some(1),
        source: Box::new(api_error(429)),
    }
}

/// Shorthand: an error with no extractable status
pub fn network_error() -> TransportError {
    TransportError::Network("connection reset by peer".into())
}
