//! Sink configuration

use std::time::Duration;

use funnel_transport::TransportConfig;

use crate::error::ConfigError;

/// How long `close()` waits for workers before counting records dropped
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Default shard count
const DEFAULT_NUM_CHANNELS: usize = 4;

/// Default workers per shard per record kind
const DEFAULT_NUM_DRAINING_THREADS: usize = 2;

/// Default shard queue capacity (messages, not records)
const DEFAULT_BUFFER: usize = 1000;

/// Default maximum records per transport call
const DEFAULT_BATCH_SIZE: usize = 500;

/// Default retry attempts per flush
const DEFAULT_MAX_RETRY: usize = 1;

/// Construction parameters for [`MultiTokenSink`](crate::MultiTokenSink)
///
/// Total workers per record kind is `num_channels * num_draining_threads`;
/// the sink runs three kinds, so the task count is three times that.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// Shard count; the primary parallelism dial for submission contention
    pub num_channels: usize,

    /// Workers draining each shard, per record kind
    pub num_draining_threads: usize,

    /// Capacity of each shard's queue, counted in messages
    pub buffer: usize,

    /// Maximum records per transport call
    pub batch_size: usize,

    /// Retry attempts per flush on retryable statuses
    pub max_retry: usize,

    /// Override for the datapoint ingest URL; `None` uses the transport default
    pub datapoint_endpoint: Option<String>,

    /// Override for the event ingest URL
    pub event_endpoint: Option<String>,

    /// Override for the span ingest URL
    pub trace_endpoint: Option<String>,

    /// Override for the HTTP user agent
    pub user_agent: Option<String>,

    /// Per-request timeout for the default HTTP clients
    pub request_timeout: Duration,

    /// How long `close()` waits for workers to finish
    pub shutdown_timeout: Duration,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            num_channels: DEFAULT_NUM_CHANNELS,
            num_draining_threads: DEFAULT_NUM_DRAINING_THREADS,
            buffer: DEFAULT_BUFFER,
            batch_size: DEFAULT_BATCH_SIZE,
            max_retry: DEFAULT_MAX_RETRY,
            datapoint_endpoint: None,
            event_endpoint: None,
            trace_endpoint: None,
            user_agent: None,
            request_timeout: funnel_transport::DEFAULT_REQUEST_TIMEOUT,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

impl SinkConfig {
    /// Set the shard count
    #[must_use]
    pub fn with_num_channels(mut self, num_channels: usize) -> Self {
        self.num_channels = num_channels;
        self
    }

    /// Set the workers per shard per record kind
    #[must_use]
    pub fn with_num_draining_threads(mut self, num_draining_threads: usize) -> Self {
        self.num_draining_threads = num_draining_threads;
        self
    }

    /// Set the shard queue capacity (messages)
    #[must_use]
    pub fn with_buffer(mut self, buffer: usize) -> Self {
        self.buffer = buffer;
        self
    }

    /// Set the maximum records per transport call
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the retry attempts per flush
    #[must_use]
    pub fn with_max_retry(mut self, max_retry: usize) -> Self {
        self.max_retry = max_retry;
        self
    }

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

    /// Set the per-request timeout for the default HTTP clients
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the shutdown timeout
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Check the sizing parameters
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroParameter`] if any of `num_channels`,
    /// `num_draining_threads`, `buffer`, or `batch_size` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_channels == 0 {
            return Err(ConfigError::ZeroParameter("num_channels"));
        }
        if self.num_draining_threads == 0 {
            return Err(ConfigError::ZeroParameter("num_draining_threads"));
        }
        if self.buffer == 0 {
            return Err(ConfigError::ZeroParameter("buffer"));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroParameter("batch_size"));
        }
        Ok(())
    }

    /// Total workers per record kind
    #[inline]
    pub fn worker_count(&self) -> usize {
        self.num_channels * self.num_draining_threads
    }

    /// The transport view of this configuration
    pub(crate) fn transport_config(&self) -> TransportConfig {
        let mut config =
            TransportConfig::default().with_request_timeout(self.request_timeout);
        if let Some(url) = &self.datapoint_endpoint {
            config = config.with_datapoint_endpoint(url);
        }
        if let Some(url) = &self.event_endpoint {
            config = config.with_event_endpoint(url);
        }
        if let Some(url) = &self.trace_endpoint {
            config = config.with_trace_endpoint(url);
        }
        if let Some(user_agent) = &self.user_agent {
            config = config.with_user_agent(user_agent);
        }
        config
    }
}
