//! Funnel - Sink
//!
//! Asynchronous multi-tenant telemetry sink. Callers submit datapoints,
//! events, and spans tagged with a tenant token and return immediately; the
//! sink batches per token, ships batches over the transport, retries
//! transient failures, and accounts for every record it accepted.
//!
//! # Architecture
//!
//! Three structurally identical pipelines, one per record kind:
//!
//! ```text
//! add_*_with_token ──hash(token)──> [shard 0: bounded channel] ──> worker ×W ──> transport
//!                                   [shard 1: bounded channel] ──> worker ×W ──> transport
//!                                   [  ...  C shards          ]
//! ```
//!
//! # Key Design
//!
//! - **Token sharding**: FNV-1a over the token picks the shard, so one
//!   tenant's traffic lands on one queue and coalesces into large batches.
//! - **Non-blocking accept**: submission uses `try_send`; a full shard fails
//!   the call with [`SubmitError::QueueFull`] and the caller applies its own
//!   backpressure.
//! - **Single-token batches**: a worker flushes before switching tokens, so
//!   every transport call authenticates exactly one tenant.
//! - **Bounded retry**: timeouts and unclassifiable errors retry up to
//!   `max_retry` times; everything else is terminal and reported to the
//!   error handler.
//! - **Broadcast shutdown**: [`MultiTokenSink::close`] cancels a shared
//!   token; workers drain what is already queued, report completion, and
//!   anything still buffered past the shutdown timeout is counted dropped.
//!
//! # Example
//!
//! ```ignore
//! use funnel_sink::{MultiTokenSink, SinkConfig};
//! use funnel_protocol::Datapoint;
//!
//! let sink = MultiTokenSink::new(SinkConfig::default())?;
//! sink.add_datapoints_with_token("org-a-ingest", vec![dp])?;
//! // ...
//! sink.close().await?;
//! ```

mod config;
mod counter;
mod error;
mod rolling;
mod router;
mod sink;
mod stats;
mod status;
mod worker;

pub use config::{SinkConfig, DEFAULT_SHUTDOWN_TIMEOUT};
pub use error::{ConfigError, ShutdownError, SubmitError};
pub use sink::{ErrorHandler, MultiTokenSink};

// Re-export the submission vocabulary so sink users need only this crate.
pub use funnel_protocol::{Context, Datapoint, Event, Span, Token, TOKEN_CTX_KEY};
pub use funnel_transport::{Transport, TransportError};

#[cfg(test)]
mod sink_test;
#[cfg(test)]
mod test_transport;
