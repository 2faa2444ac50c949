//! Sink error types

use thiserror::Error;

use funnel_protocol::TOKEN_CTX_KEY;

/// Errors returned synchronously from the submission surface
///
/// Flush-time transport failures are never returned here; by the time a
/// batch fails the submission has long since succeeded. Those surface
/// through the error handler callback and the per-token status counters.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    /// The context-carrying form found no token in the context
    #[error("no token found in the submission context under key '{TOKEN_CTX_KEY}'")]
    MissingToken,

    /// The supplied token was the empty string
    #[error("token must not be empty")]
    EmptyToken,

    /// The sink has begun shutting down
    #[error("sink is closed")]
    Closed,

    /// The token's shard queue is at capacity
    #[error("shard queue is full")]
    QueueFull,
}

/// Invalid construction parameter
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A sizing parameter that must be at least one was zero
    #[error("{0} must be greater than zero")]
    ZeroParameter(&'static str),
}

/// Shutdown did not complete within the shutdown timeout
///
/// Counts are approximate: workers may still be finishing their in-flight
/// flush when the snapshot is taken.
#[derive(Debug, Error, PartialEq, Eq)]
#[error(
    "{workers} workers timed out while stopping the sink; approximately \
     {datapoints} datapoints, {events} events and {spans} spans may have been dropped"
)]
pub struct ShutdownError {
    /// Workers that had not reported completion at the timeout
    pub workers: usize,
    /// Datapoints still buffered at the timeout
    pub datapoints: i64,
    /// Events still buffered at the timeout
    pub events: i64,
    /// Spans still buffered at the timeout
    pub spans: i64,
}
