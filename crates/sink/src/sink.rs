//! The multi-token sink
//!
//! Construction wires up three record-kind pipelines (shard channels plus
//! draining workers) and the self-metrics subsystem; the public surface is
//! the submission methods, the self-metrics read, and `close()`.

use std::sync::Arc;
use std::time::Duration;

use crossfire::mpmc;
use tokio::sync::{mpsc, Mutex};
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use funnel_protocol::{Context, Datapoint, Event, Span, Token, TOKEN_CTX_KEY};
use funnel_transport::{HttpTransport, Transport, TransportError};

use crate::config::SinkConfig;
use crate::error::{ConfigError, ShutdownError, SubmitError};
use crate::router::{ShardedSubmitter, TokenBatch};
use crate::stats::{KindStats, SinkStats};
use crate::worker::Worker;

/// Callback invoked with every terminal transport error
///
/// Runs on worker tasks; it must not block indefinitely.
pub type ErrorHandler = Arc<dyn Fn(&TransportError) + Send + Sync>;

fn default_error_handler() -> ErrorHandler {
    Arc::new(|err| warn!(error = %err, "dropping batch after terminal transport error"))
}

/// Completion reports from the three worker pools, consumed by `close()`
struct DoneChannels {
    datapoints: mpsc::Receiver<()>,
    events: mpsc::Receiver<()>,
    spans: mpsc::Receiver<()>,
}

/// Asynchronous multi-tenant telemetry sink
///
/// Submissions are non-blocking: they hash the token to a shard, enqueue,
/// and return. Batching, transport dispatch, retry, and accounting happen on
/// the sink's worker tasks. See the crate docs for the full picture.
///
/// Must be constructed within a tokio runtime; construction spawns the
/// worker and counter tasks.
pub struct MultiTokenSink {
    datapoints: ShardedSubmitter<Datapoint>,
    events: ShardedSubmitter<Event>,
    spans: ShardedSubmitter<Span>,
    stats: Arc<SinkStats>,
    closing: CancellationToken,
    shutdown_timeout: Duration,
    workers_per_kind: usize,
    done: Mutex<Option<DoneChannels>>,
}

impl MultiTokenSink {
    /// Create a sink that ships batches over HTTP
    ///
    /// Each worker gets its own [`HttpTransport`] built from the config's
    /// endpoint, user-agent, and timeout settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a sizing parameter is zero.
    pub fn new(config: SinkConfig) -> Result<Self, ConfigError> {
        let transport_config = config.transport_config();
        Self::with_transport_factory(config, None, move || {
            HttpTransport::new(transport_config.clone())
        })
    }

    /// Create a sink with a custom terminal-error handler
    ///
    /// The default handler logs the error and drops it.
    pub fn with_error_handler(
        config: SinkConfig,
        error_handler: ErrorHandler,
    ) -> Result<Self, ConfigError> {
        let transport_config = config.transport_config();
        Self::with_transport_factory(config, Some(error_handler), move || {
            HttpTransport::new(transport_config.clone())
        })
    }

    /// Create a sink over a custom transport
    ///
    /// The factory runs once per worker per record kind, so every worker
    /// owns its own transport instance.
    pub fn with_transport_factory<T, F>(
        config: SinkConfig,
        error_handler: Option<ErrorHandler>,
        factory: F,
    ) -> Result<Self, ConfigError>
    where
        T: Transport<Datapoint> + Transport<Event> + Transport<Span> + 'static,
        F: Fn() -> T,
    {
        config.validate()?;

        let closing = CancellationToken::new();
        let stats = Arc::new(SinkStats::new(&config));
        let error_handler = error_handler.unwrap_or_else(default_error_handler);
        let workers_per_kind = config.worker_count();

        let (dp_done_tx, dp_done_rx) = mpsc::channel(workers_per_kind);
        let (ev_done_tx, ev_done_rx) = mpsc::channel(workers_per_kind);
        let (span_done_tx, span_done_rx) = mpsc::channel(workers_per_kind);

        let datapoints = spawn_pipeline(
            &config,
            stats.datapoint_stats(),
            &closing,
            dp_done_tx,
            &error_handler,
            &factory,
        );
        let events = spawn_pipeline(
            &config,
            stats.event_stats(),
            &closing,
            ev_done_tx,
            &error_handler,
            &factory,
        );
        let spans = spawn_pipeline(
            &config,
            stats.span_stats(),
            &closing,
            span_done_tx,
            &error_handler,
            &factory,
        );

        debug!(
            num_channels = config.num_channels,
            num_draining_threads = config.num_draining_threads,
            buffer = config.buffer,
            batch_size = config.batch_size,
            max_retry = config.max_retry,
            "multi token sink started"
        );

        Ok(Self {
            datapoints,
            events,
            spans,
            stats,
            closing,
            shutdown_timeout: config.shutdown_timeout,
            workers_per_kind,
            done: Mutex::new(Some(DoneChannels {
                datapoints: dp_done_rx,
                events: ev_done_rx,
                spans: span_done_rx,
            })),
        })
    }

    /// Submit datapoints under an explicit token
    ///
    /// Non-blocking. On success the sink owns the records until their batch
    /// completes its final transport attempt.
    pub fn add_datapoints_with_token(
        &self,
        token: impl Into<Token>,
        datapoints: Vec<Datapoint>,
    ) -> Result<(), SubmitError> {
        let token = token.into();
        if token.is_empty() {
            return Err(SubmitError::EmptyToken);
        }
        self.datapoints.try_submit(token, datapoints)
    }

    /// Submit datapoints, reading the token from the context
    ///
    /// The token is looked up under [`TOKEN_CTX_KEY`].
    pub fn add_datapoints(
        &self,
        ctx: &Context,
        datapoints: Vec<Datapoint>,
    ) -> Result<(), SubmitError> {
        let token = ctx.get(TOKEN_CTX_KEY).ok_or(SubmitError::MissingToken)?;
        self.add_datapoints_with_token(token, datapoints)
    }

    /// Submit events under an explicit token
    pub fn add_events_with_token(
        &self,
        token: impl Into<Token>,
        events: Vec<Event>,
    ) -> Result<(), SubmitError> {
        let token = token.into();
        if token.is_empty() {
            return Err(SubmitError::EmptyToken);
        }
        self.events.try_submit(token, events)
    }

    /// Submit events, reading the token from the context
    pub fn add_events(&self, ctx: &Context, events: Vec<Event>) -> Result<(), SubmitError> {
        let token = ctx.get(TOKEN_CTX_KEY).ok_or(SubmitError::MissingToken)?;
        self.add_events_with_token(token, events)
    }

    /// Submit spans under an explicit token
    pub fn add_spans_with_token(
        &self,
        token: impl Into<Token>,
        spans: Vec<Span>,
    ) -> Result<(), SubmitError> {
        let token = token.into();
        if token.is_empty() {
            return Err(SubmitError::EmptyToken);
        }
        self.spans.try_submit(token, spans)
    }

    /// Submit spans, reading the token from the context
    pub fn add_spans(&self, ctx: &Context, spans: Vec<Span>) -> Result<(), SubmitError> {
        let token = ctx.get(TOKEN_CTX_KEY).ok_or(SubmitError::MissingToken)?;
        self.add_spans_with_token(token, spans)
    }

    /// Self-metrics: buffered gauges, per-token flush outcome counters,
    /// batch-size statistics, and the cumulative retry counter
    pub async fn datapoints(&self) -> Vec<Datapoint> {
        self.stats.datapoints().await
    }

    /// Stop accepting submissions and wait for workers to drain
    ///
    /// Broadcasts the shutdown signal, then waits until every worker has
    /// reported completion or the shutdown timeout elapses. Workers finish
    /// their in-flight flush, retries included; they are never cancelled
    /// mid-flush. Records still buffered after the wait are counted dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ShutdownError`] when workers remain or records were
    /// dropped. A second call observes the first call's wait already done
    /// and returns `Ok(())`.
    pub async fn close(&self) -> Result<(), ShutdownError> {
        self.closing.cancel();

        let Some(mut done) = self.done.lock().await.take() else {
            return Ok(());
        };

        let deadline = Instant::now() + self.shutdown_timeout;
        let mut dp_left = self.workers_per_kind;
        let mut ev_left = self.workers_per_kind;
        let mut span_left = self.workers_per_kind;

        while dp_left + ev_left + span_left > 0 {
            tokio::select! {
                _ = sleep_until(deadline) => break,
                msg = done.datapoints.recv(), if dp_left > 0 => match msg {
                    Some(()) => dp_left -= 1,
                    None => dp_left = 0,
                },
                msg = done.events.recv(), if ev_left > 0 => match msg {
                    Some(()) => ev_left -= 1,
                    None => ev_left = 0,
                },
                msg = done.spans.recv(), if span_left > 0 => match msg {
                    Some(()) => span_left -= 1,
                    None => span_left = 0,
                },
            }
        }

        self.stats.stop_counters();

        let workers = dp_left + ev_left + span_left;
        let datapoints = self.stats.datapoints_buffered();
        let events = self.stats.events_buffered();
        let spans = self.stats.spans_buffered();
        if workers > 0 || datapoints > 0 || events > 0 || spans > 0 {
            warn!(
                workers,
                datapoints, events, spans, "sink shutdown incomplete"
            );
            return Err(ShutdownError {
                workers,
                datapoints,
                events,
                spans,
            });
        }

        debug!("multi token sink closed");
        Ok(())
    }
}

/// Build one record kind's pipeline: C shard channels, each drained by W
/// workers holding their own transport
fn spawn_pipeline<R, T, F>(
    config: &SinkConfig,
    stats: KindStats,
    closing: &CancellationToken,
    done: mpsc::Sender<()>,
    error_handler: &ErrorHandler,
    factory: &F,
) -> ShardedSubmitter<R>
where
    R: Send + Sync + Unpin + 'static,
    T: Transport<R> + 'static,
    F: Fn() -> T,
{
    let mut shards = Vec::with_capacity(config.num_channels);
    let mut worker_id = 0;
    for _ in 0..config.num_channels {
        let (tx, rx) = mpmc::bounded_async::<TokenBatch<R>>(config.buffer);
        for _ in 0..config.num_draining_threads {
            let worker = Worker::new(
                worker_id,
                factory(),
                rx.clone(),
                config.batch_size,
                config.max_retry,
                stats.clone(),
                error_handler.clone(),
                closing.clone(),
                done.clone(),
            );
            tokio::spawn(worker.run());
            worker_id += 1;
        }
        shards.push(tx);
    }
    ShardedSubmitter::new(shards, closing.clone(), stats.buffered.clone())
}
