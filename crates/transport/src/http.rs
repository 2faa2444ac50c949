//! HTTP transport
//!
//! JSON-over-HTTP implementation of [`Transport`] for all three record
//! kinds. Each batch becomes one POST with the tenant token in the
//! [`TOKEN_HEADER_NAME`] header.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use tracing::trace;

use funnel_protocol::{Datapoint, Event, Span, Token, TOKEN_HEADER_NAME};

use crate::{Transport, TransportConfig, TransportError, DEFAULT_USER_AGENT};

/// Response bodies longer than this are truncated in error messages
const MAX_ERROR_BODY: usize = 512;

/// Production transport: JSON batches over HTTP
///
/// One instance per sink worker. The instance is bound to its endpoints at
/// construction; the token is taken per send, since one worker serves many
/// tenants over its lifetime.
pub struct HttpTransport {
    client: reqwest::Client,
    datapoint_url: String,
    event_url: String,
    trace_url: String,
}

impl HttpTransport {
    /// Create a transport with a client built from the config
    ///
    /// The client applies the configured request timeout and user agent.
    pub fn new(config: TransportConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT))
            .build()
            .unwrap_or_default();
        Self::with_client(config, client)
    }

    /// Create a transport around an externally built client
    pub fn with_client(config: TransportConfig, client: reqwest::Client) -> Self {
        Self {
            client,
            datapoint_url: config.datapoint_url(),
            event_url: config.event_url(),
            trace_url: config.trace_url(),
        }
    }

    async fn post<B: Serialize + Sync>(
        &self,
        url: &str,
        token: &Token,
        batch: &[B],
    ) -> Result<(), TransportError> {
        let response = self
            .client
            .post(url)
            .header(TOKEN_HEADER_NAME, token.as_str())
            .json(batch)
            .send()
            .await
            .map_err(|err| {
                if err.is_builder() || err.is_body() {
                    TransportError::Body(err.to_string())
                } else {
                    TransportError::Network(err.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            trace!(url, count = batch.len(), "batch accepted");
            return Ok(());
        }

        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok());

        let mut message = response.text().await.unwrap_or_default();
        message.truncate(MAX_ERROR_BODY);

        let api = TransportError::Api {
            status: status.as_u16(),
            message,
        };
        if status == StatusCode::TOO_MANY_REQUESTS {
            Err(TransportError::TooManyRequests {
                retry_after,
                source: Box::new(api),
            })
        } else {
            Err(api)
        }
    }
}

#[async_trait]
impl Transport<Datapoint> for HttpTransport {
    async fn send_batch(&self, token: &Token, batch: &[Datapoint]) -> Result<(), TransportError> {
        self.post(&self.datapoint_url, token, batch).await
    }
}

#[async_trait]
impl Transport<Event> for HttpTransport {
    async fn send_batch(&self, token: &Token, batch: &[Event]) -> Result<(), TransportError> {
        self.post(&self.event_url, token, batch).await
    }
}

#[async_trait]
impl Transport<Span> for HttpTransport {
    async fn send_batch(&self, token: &Token, batch: &[Span]) -> Result<(), TransportError> {
        self.post(&self.trace_url, token, batch).await
    }
}
