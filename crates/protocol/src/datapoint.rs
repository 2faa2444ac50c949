//! Metric datapoint type
//!
//! A `Datapoint` is one observation of one metric: a name, a set of
//! dimensions, a value, and a metric type. The sink also renders its own
//! self-metrics as datapoints, through the [`Datapoint::gauge`] and
//! [`Datapoint::cumulative`] constructors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The value carried by a datapoint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    /// Integer-valued observation
    Int(i64),
    /// Floating-point observation
    Double(f64),
}

impl From<i64> for MetricValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

/// How a datapoint's value relates to previous values of the same metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricType {
    /// Instantaneous reading; each observation replaces the last
    Gauge,
    /// Monotonically increasing total since process start
    Cumulative,
    /// Delta since the previous report
    Counter,
}

/// One metric observation
///
/// # Example
///
/// ```
/// use funnel_protocol::{Datapoint, MetricType};
///
/// let dp = Datapoint::gauge("queue_depth", Default::default(), 42);
/// assert_eq!(dp.metric, "queue_depth");
/// assert_eq!(dp.metric_type, MetricType::Gauge);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Datapoint {
    /// Metric name
    pub metric: String,

    /// Dimensions identifying the time series within the metric
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dimensions: BTreeMap<String, String>,

    /// The observed value
    pub value: MetricValue,

    /// Metric type
    #[serde(rename = "type")]
    pub metric_type: MetricType,

    /// Observation time in milliseconds since the epoch; `None` means the
    /// ingest service assigns the receive time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

impl Datapoint {
    /// Create a datapoint with an explicit metric type
    pub fn new(
        metric: impl Into<String>,
        dimensions: BTreeMap<String, String>,
        value: impl Into<MetricValue>,
        metric_type: MetricType,
    ) -> Self {
        Self {
            metric: metric.into(),
            dimensions,
            value: value.into(),
            metric_type,
            timestamp: None,
        }
    }

    /// Create a gauge datapoint
    pub fn gauge(
        metric: impl Into<String>,
        dimensions: BTreeMap<String, String>,
        value: impl Into<MetricValue>,
    ) -> Self {
        Self::new(metric, dimensions, value, MetricType::Gauge)
    }

    /// Create a cumulative-counter datapoint
    pub fn cumulative(
        metric: impl Into<String>,
        dimensions: BTreeMap<String, String>,
        value: impl Into<MetricValue>,
    ) -> Self {
        Self::new(metric, dimensions, value, MetricType::Cumulative)
    }

    /// Set the observation timestamp (milliseconds since the epoch)
    #[must_use]
    pub fn with_timestamp(mut self, millis: u64) -> Self {
        self.timestamp = Some(millis);
        self
    }
}
