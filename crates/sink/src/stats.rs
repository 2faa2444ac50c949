//! Sink self-metrics
//!
//! `SinkStats` owns everything the sink reports about itself: buffered
//! gauges, retry counter, per-kind batch-size rolling buckets, and the three
//! per-token status counters. Workers see one kind's slice of it through
//! `KindStats`.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

use funnel_protocol::Datapoint;

use crate::config::SinkConfig;
use crate::counter::{CounterHandle, TokenStatusCounter};
use crate::rolling::RollingBucket;

fn batch_size_dims(datum_type: &str) -> BTreeMap<String, String> {
    BTreeMap::from([("datum_type".to_string(), datum_type.to_string())])
}

/// The per-kind stats slice handed to workers and submitters
#[derive(Clone)]
pub(crate) struct KindStats {
    /// Record kind label used in logs
    pub kind: &'static str,
    /// Records accepted but not yet through their final transport attempt
    pub buffered: Arc<AtomicI64>,
    /// Sizes of flushed batches
    pub batch_sizes: Arc<RollingBucket>,
    /// Terminal flush outcomes by token and status
    pub by_token: CounterHandle,
    /// Process-wide retry counter, shared across kinds
    pub retries: Arc<AtomicU64>,
}

/// All counters and gauges the sink maintains about itself
pub(crate) struct SinkStats {
    default_dims: BTreeMap<String, String>,

    datapoints_by_token: CounterHandle,
    events_by_token: CounterHandle,
    spans_by_token: CounterHandle,

    dp_batch_sizes: Arc<RollingBucket>,
    ev_batch_sizes: Arc<RollingBucket>,
    span_batch_sizes: Arc<RollingBucket>,

    dp_buffered: Arc<AtomicI64>,
    ev_buffered: Arc<AtomicI64>,
    span_buffered: Arc<AtomicI64>,

    retries: Arc<AtomicU64>,
}

impl SinkStats {
    /// Build the stats object and spawn the three counter tasks
    pub fn new(config: &SinkConfig) -> Self {
        let worker_count = config.worker_count();
        let default_dims = BTreeMap::from([
            ("buffer_size".to_string(), config.buffer.to_string()),
            ("numChannels".to_string(), config.num_channels.to_string()),
            (
                "numDrainingThreads".to_string(),
                config.num_draining_threads.to_string(),
            ),
            ("worker_count".to_string(), worker_count.to_string()),
            ("batch_size".to_string(), config.batch_size.to_string()),
        ]);
        let counter_capacity = config.buffer * worker_count;

        Self {
            datapoints_by_token: TokenStatusCounter::spawn(
                "total_datapoints_by_token",
                counter_capacity,
                default_dims.clone(),
            ),
            events_by_token: TokenStatusCounter::spawn(
                "total_events_by_token",
                counter_capacity,
                default_dims.clone(),
            ),
            spans_by_token: TokenStatusCounter::spawn(
                "total_spans_by_token",
                counter_capacity,
                default_dims.clone(),
            ),
            dp_batch_sizes: Arc::new(RollingBucket::new(
                "batch_sizes",
                batch_size_dims("datapoint"),
            )),
            ev_batch_sizes: Arc::new(RollingBucket::new("batch_sizes", batch_size_dims("event"))),
            span_batch_sizes: Arc::new(RollingBucket::new("batch_sizes", batch_size_dims("span"))),
            dp_buffered: Arc::new(AtomicI64::new(0)),
            ev_buffered: Arc::new(AtomicI64::new(0)),
            span_buffered: Arc::new(AtomicI64::new(0)),
            retries: Arc::new(AtomicU64::new(0)),
            default_dims,
        }
    }

    /// The datapoint pipeline's stats slice
    pub fn datapoint_stats(&self) -> KindStats {
        KindStats {
            kind: "datapoint",
            buffered: self.dp_buffered.clone(),
            batch_sizes: self.dp_batch_sizes.clone(),
            by_token: self.datapoints_by_token.clone(),
            retries: self.retries.clone(),
        }
    }

    /// The event pipeline's stats slice
    pub fn event_stats(&self) -> KindStats {
        KindStats {
            kind: "event",
            buffered: self.ev_buffered.clone(),
            batch_sizes: self.ev_batch_sizes.clone(),
            by_token: self.events_by_token.clone(),
            retries: self.retries.clone(),
        }
    }

    /// The span pipeline's stats slice
    pub fn span_stats(&self) -> KindStats {
        KindStats {
            kind: "span",
            buffered: self.span_buffered.clone(),
            batch_sizes: self.span_batch_sizes.clone(),
            by_token: self.spans_by_token.clone(),
            retries: self.retries.clone(),
        }
    }

    /// Datapoints accepted but not yet through their final transport attempt
    #[inline]
    pub fn datapoints_buffered(&self) -> i64 {
        self.dp_buffered.load(Ordering::Relaxed)
    }

    /// Events accepted but not yet through their final transport attempt
    #[inline]
    pub fn events_buffered(&self) -> i64 {
        self.ev_buffered.load(Ordering::Relaxed)
    }

    /// Spans accepted but not yet through their final transport attempt
    #[inline]
    pub fn spans_buffered(&self) -> i64 {
        self.span_buffered.load(Ordering::Relaxed)
    }

    /// Total additional transport attempts across all kinds
    #[inline]
    pub fn retries(&self) -> u64 {
        self.retries.load(Ordering::Relaxed)
    }

    /// Stop the three counter tasks
    pub fn stop_counters(&self) {
        self.datapoints_by_token.stop();
        self.events_by_token.stop();
        self.spans_by_token.stop();
    }

    /// Render everything as self-metric datapoints
    pub async fn datapoints(&self) -> Vec<Datapoint> {
        let mut datapoints = vec![
            Datapoint::gauge(
                "total_datapoints_buffered",
                self.default_dims.clone(),
                self.datapoints_buffered(),
            ),
            Datapoint::gauge(
                "total_events_buffered",
                self.default_dims.clone(),
                self.events_buffered(),
            ),
            Datapoint::gauge(
                "total_spans_buffered",
                self.default_dims.clone(),
                self.spans_buffered(),
            ),
        ];
        datapoints.extend(self.datapoints_by_token.datapoints().await);
        datapoints.extend(self.events_by_token.datapoints().await);
        datapoints.extend(self.spans_by_token.datapoints().await);
        datapoints.extend(self.dp_batch_sizes.datapoints());
        datapoints.extend(self.ev_batch_sizes.datapoints());
        datapoints.extend(self.span_batch_sizes.datapoints());
        datapoints.push(Datapoint::cumulative(
            "total_retries",
            self.default_dims.clone(),
            self.retries() as i64,
        ));
        datapoints
    }
}
