//! End-to-end sink tests
//!
//! Full pipelines over the recording transport: submission through shard
//! channels, worker batching, self-metrics, and shutdown.

use std::time::Duration;

use funnel_protocol::{Context, Datapoint, Event, MetricValue, Span};

use crate::config::SinkConfig;
use crate::counter_test::counter_value;
use crate::error::SubmitError;
use crate::sink::MultiTokenSink;
use crate::test_transport::RecordingTransport;

/// Helper to create a test datapoint
fn dp(metric: &str) -> Datapoint {
    Datapoint::gauge(metric, Default::default(), 1i64)
}

fn sink_over(transport: &RecordingTransport, config: SinkConfig) -> MultiTokenSink {
    let transport = transport.clone();
    MultiTokenSink::with_transport_factory(config, None, move || transport.clone())
        .expect("valid config")
}

/// Let the spawned workers and counter tasks drain what is already queued
async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}

fn gauge_value(datapoints: &[Datapoint], metric: &str) -> Option<i64> {
    datapoints
        .iter()
        .find(|dp| dp.metric == metric)
        .map(|dp| match dp.value {
            MetricValue::Int(v) => v,
            MetricValue::Double(v) => v as i64,
        })
}

// ============================================================================
// Happy Path
// ============================================================================

#[tokio::test]
async fn test_same_token_submissions_coalesce() {
    let transport = RecordingTransport::new();
    let sink = sink_over(
        &transport,
        SinkConfig::default()
            .with_num_channels(2)
            .with_num_draining_threads(2)
            .with_buffer(16)
            .with_batch_size(3),
    );

    sink.add_datapoints_with_token("a", vec![dp("d1"), dp("d2")])
        .unwrap();
    sink.add_datapoints_with_token("a", vec![dp("d3")]).unwrap();
    settle().await;

    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].kind, "datapoint");
    assert_eq!(calls[0].token, "a");
    assert_eq!(calls[0].records, vec!["d1", "d2", "d3"]);

    let self_metrics = sink.datapoints().await;
    assert_eq!(gauge_value(&self_metrics, "total_datapoints_buffered"), Some(0));
    let by_token: Vec<Datapoint> = self_metrics
        .iter()
        .filter(|dp| dp.metric == "total_datapoints_by_token")
        .cloned()
        .collect();
    assert_eq!(counter_value(&by_token, "a", "OK"), Some(3));

    sink.close().await.unwrap();
}

#[tokio::test]
async fn test_token_switch_keeps_batches_single_token() {
    let transport = RecordingTransport::new();
    let sink = sink_over(
        &transport,
        SinkConfig::default()
            .with_num_channels(1)
            .with_num_draining_threads(1)
            .with_buffer(16)
            .with_batch_size(10),
    );

    sink.add_datapoints_with_token("a", vec![dp("d1"), dp("d2")])
        .unwrap();
    sink.add_datapoints_with_token("b", vec![dp("d3"), dp("d4")])
        .unwrap();
    sink.close().await.unwrap();

    let calls = transport.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].token, "a");
    assert_eq!(calls[0].records, vec!["d1", "d2"]);
    assert_eq!(calls[1].token, "b");
    assert_eq!(calls[1].records, vec!["d3", "d4"]);
}

#[tokio::test]
async fn test_all_three_pipelines_flow_independently() {
    let transport = RecordingTransport::new();
    let sink = sink_over(
        &transport,
        SinkConfig::default()
            .with_num_channels(1)
            .with_num_draining_threads(1)
            .with_buffer(16)
            .with_batch_size(10),
    );

    sink.add_datapoints_with_token("a", vec![dp("d1")]).unwrap();
    sink.add_events_with_token("a", vec![Event::new("deploy.finished")])
        .unwrap();
    sink.add_spans_with_token("a", vec![Span::new("trace-1", "span-1")])
        .unwrap();
    sink.close().await.unwrap();

    let calls = transport.calls();
    assert_eq!(calls.len(), 3);
    let kinds: Vec<&str> = calls.iter().map(|c| c.kind).collect();
    assert!(kinds.contains(&"datapoint"));
    assert!(kinds.contains(&"event"));
    assert!(kinds.contains(&"span"));
    for call in &calls {
        assert_eq!(call.token, "a");
        assert_eq!(call.records.len(), 1);
    }
}

// ============================================================================
// Submission Surface
// ============================================================================

#[tokio::test]
async fn test_context_submission_round_trip() {
    let transport = RecordingTransport::new();
    let sink = sink_over(
        &transport,
        SinkConfig::default()
            .with_num_channels(1)
            .with_num_draining_threads(1)
            .with_buffer(16)
            .with_batch_size(10),
    );

    let ctx = Context::with_token("org-a");
    sink.add_datapoints(&ctx, vec![dp("d1")]).unwrap();
    sink.close().await.unwrap();

    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].token, "org-a");
}

#[tokio::test]
async fn test_context_without_token_rejected() {
    let transport = RecordingTransport::new();
    let sink = sink_over(&transport, SinkConfig::default());

    let ctx = Context::new();
    assert_eq!(
        sink.add_datapoints(&ctx, vec![dp("d1")]),
        Err(SubmitError::MissingToken)
    );
    assert_eq!(
        sink.add_events(&ctx, vec![Event::new("x")]),
        Err(SubmitError::MissingToken)
    );
    assert_eq!(
        sink.add_spans(&ctx, vec![Span::new("t", "s")]),
        Err(SubmitError::MissingToken)
    );
}

#[tokio::test]
async fn test_empty_token_rejected() {
    let transport = RecordingTransport::new();
    let sink = sink_over(&transport, SinkConfig::default());

    assert_eq!(
        sink.add_datapoints_with_token("", vec![dp("d1")]),
        Err(SubmitError::EmptyToken)
    );
}

#[tokio::test]
async fn test_queue_full_leaves_gauge_unchanged() {
    let transport = RecordingTransport::new();
    let sink = sink_over(
        &transport,
        SinkConfig::default()
            .with_num_channels(1)
            .with_num_draining_threads(1)
            .with_buffer(2)
            .with_batch_size(10),
    );

    // Workers have not run yet, so the shard queue fills at two messages.
    sink.add_datapoints_with_token("a", vec![dp("d1")]).unwrap();
    sink.add_datapoints_with_token("a", vec![dp("d2")]).unwrap();
    assert_eq!(
        sink.add_datapoints_with_token("a", vec![dp("d3")]),
        Err(SubmitError::QueueFull)
    );

    let self_metrics = sink.datapoints().await;
    assert_eq!(gauge_value(&self_metrics, "total_datapoints_buffered"), Some(2));

    sink.close().await.unwrap();
}

#[tokio::test]
async fn test_submissions_rejected_after_close() {
    let transport = RecordingTransport::new();
    let sink = sink_over(&transport, SinkConfig::default());

    sink.close().await.unwrap();

    assert_eq!(
        sink.add_datapoints_with_token("a", vec![dp("d1")]),
        Err(SubmitError::Closed)
    );
    assert_eq!(
        sink.add_spans_with_token("a", vec![Span::new("t", "s")]),
        Err(SubmitError::Closed)
    );
}

// ============================================================================
// Self-Metrics
// ============================================================================

#[tokio::test]
async fn test_self_metrics_shape() {
    let transport = RecordingTransport::new();
    let sink = sink_over(
        &transport,
        SinkConfig::default()
            .with_num_channels(2)
            .with_num_draining_threads(3)
            .with_buffer(7)
            .with_batch_size(11),
    );

    let self_metrics = sink.datapoints().await;
    for metric in [
        "total_datapoints_buffered",
        "total_events_buffered",
        "total_spans_buffered",
        "total_retries",
    ] {
        let dp = self_metrics
            .iter()
            .find(|dp| dp.metric == metric)
            .unwrap_or_else(|| panic!("missing self metric {metric}"));
        assert_eq!(dp.dimensions.get("buffer_size").map(String::as_str), Some("7"));
        assert_eq!(dp.dimensions.get("numChannels").map(String::as_str), Some("2"));
        assert_eq!(
            dp.dimensions.get("numDrainingThreads").map(String::as_str),
            Some("3")
        );
        assert_eq!(dp.dimensions.get("worker_count").map(String::as_str), Some("6"));
        assert_eq!(dp.dimensions.get("batch_size").map(String::as_str), Some("11"));
    }

    // One batch-size bucket per record kind.
    let buckets = self_metrics
        .iter()
        .filter(|dp| dp.metric == "batch_sizes.count")
        .count();
    assert_eq!(buckets, 3);

    sink.close().await.unwrap();
}

#[tokio::test]
async fn test_counter_entries_carry_default_dims() {
    let transport = RecordingTransport::new();
    let sink = sink_over(
        &transport,
        SinkConfig::default()
            .with_num_channels(1)
            .with_num_draining_threads(1)
            .with_buffer(16)
            .with_batch_size(10),
    );

    sink.add_events_with_token("a", vec![Event::new("x"), Event::new("y")])
        .unwrap();
    settle().await;

    let self_metrics = sink.datapoints().await;
    let entry = self_metrics
        .iter()
        .find(|dp| dp.metric == "total_events_by_token")
        .expect("event counter entry");
    assert_eq!(entry.dimensions.get("token").map(String::as_str), Some("a"));
    assert_eq!(entry.dimensions.get("status").map(String::as_str), Some("OK"));
    assert!(entry.dimensions.contains_key("worker_count"));
    assert_eq!(entry.value, MetricValue::Int(2));

    sink.close().await.unwrap();
}

// ============================================================================
// Shutdown
// ============================================================================

#[tokio::test]
async fn test_close_drains_in_flight_records() {
    let transport = RecordingTransport::new();
    let sink = sink_over(
        &transport,
        SinkConfig::default()
            .with_num_channels(2)
            .with_num_draining_threads(2)
            .with_buffer(256)
            .with_batch_size(50),
    );

    for i in 0..100 {
        let records = (0..10).map(|j| dp(&format!("d{i}-{j}"))).collect();
        sink.add_datapoints_with_token("a", records).unwrap();
    }
    sink.close().await.unwrap();

    let calls = transport.calls();
    let total: usize = calls.iter().map(|c| c.records.len()).sum();
    assert_eq!(total, 1000);
    for call in &calls {
        assert!(call.records.len() <= 50);
        assert_eq!(call.token, "a");
    }

    let self_metrics = sink.datapoints().await;
    assert_eq!(gauge_value(&self_metrics, "total_datapoints_buffered"), Some(0));
}

#[tokio::test]
async fn test_close_times_out_on_stalled_transport() {
    let transport = RecordingTransport::with_delay(Duration::from_secs(60));
    let sink = sink_over(
        &transport,
        SinkConfig::default()
            .with_num_channels(1)
            .with_num_draining_threads(1)
            .with_buffer(16)
            .with_batch_size(100)
            .with_shutdown_timeout(Duration::from_millis(200)),
    );

    let records = (0..1000).map(|i| dp(&format!("d{i}"))).collect();
    sink.add_datapoints_with_token("a", records).unwrap();

    let err = sink.close().await.unwrap_err();
    assert_eq!(err.workers, 1);
    assert_eq!(err.datapoints, 1000);
    assert_eq!(err.events, 0);
    assert_eq!(err.spans, 0);

    assert_eq!(
        sink.add_datapoints_with_token("a", vec![dp("late")]),
        Err(SubmitError::Closed)
    );
}

#[tokio::test]
async fn test_close_is_idempotent() {
    let transport = RecordingTransport::new();
    let sink = sink_over(&transport, SinkConfig::default());

    sink.close().await.unwrap();
    sink.close().await.unwrap();
}

#[tokio::test]
async fn test_zero_sized_config_rejected_at_construction() {
    let transport = RecordingTransport::new();
    let result = MultiTokenSink::with_transport_factory(
        SinkConfig::default().with_buffer(0),
        None,
        move || transport.clone(),
    );
    assert!(result.is_err());

    assert!(MultiTokenSink::new(SinkConfig::default().with_num_channels(0)).is_err());
}

#[tokio::test]
async fn test_same_token_always_routes_to_same_worker_queue() {
    // Two single-record submissions far apart in time still coalesce at the
    // same shard, so a single worker sees both.
    let transport = RecordingTransport::new();
    let sink = sink_over(
        &transport,
        SinkConfig::default()
            .with_num_channels(4)
            .with_num_draining_threads(1)
            .with_buffer(16)
            .with_batch_size(10),
    );

    sink.add_datapoints_with_token("steady-token", vec![dp("d1")])
        .unwrap();
    settle().await;
    sink.add_datapoints_with_token("steady-token", vec![dp("d2")])
        .unwrap();
    sink.close().await.unwrap();

    let calls = transport.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|c| c.token == "steady-token"));
}
