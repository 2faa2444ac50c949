//! Rolling batch-size statistics
//!
//! A `RollingBucket` tracks cumulative count/sum of observed values plus the
//! min/max of the most recently completed time window. Workers record every
//! flushed batch size; the self-metrics surface renders the result.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use funnel_protocol::Datapoint;

/// Width of one min/max window
const DEFAULT_BUCKET_WIDTH: Duration = Duration::from_secs(20);

/// Windowed observation statistics for one stream of values
pub(crate) struct RollingBucket {
    name: &'static str,
    dimensions: BTreeMap<String, String>,
    width: Duration,
    inner: Mutex<Window>,
}

struct Window {
    rotated_at: Instant,
    count: u64,
    sum: f64,
    window_min: Option<f64>,
    window_max: Option<f64>,
    last_min: Option<f64>,
    last_max: Option<f64>,
}

impl Window {
    fn rotate_if_due(&mut self, width: Duration) {
        let now = Instant::now();
        if now.duration_since(self.rotated_at) >= width {
            self.last_min = self.window_min.take();
            self.last_max = self.window_max.take();
            self.rotated_at = now;
        }
    }
}

impl RollingBucket {
    /// Create a bucket with the default window width
    pub fn new(name: &'static str, dimensions: BTreeMap<String, String>) -> Self {
        Self::with_width(name, dimensions, DEFAULT_BUCKET_WIDTH)
    }

    /// Create a bucket with an explicit window width
    pub fn with_width(
        name: &'static str,
        dimensions: BTreeMap<String, String>,
        width: Duration,
    ) -> Self {
        Self {
            name,
            dimensions,
            width,
            inner: Mutex::new(Window {
                rotated_at: Instant::now(),
                count: 0,
                sum: 0.0,
                window_min: None,
                window_max: None,
                last_min: None,
                last_max: None,
            }),
        }
    }

    /// Record one observation
    pub fn record(&self, value: f64) {
        let mut window = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        window.rotate_if_due(self.width);
        window.count += 1;
        window.sum += value;
        window.window_min = Some(window.window_min.map_or(value, |min| min.min(value)));
        window.window_max = Some(window.window_max.map_or(value, |max| max.max(value)));
    }

    /// Render the bucket as self-metric datapoints
    ///
    /// Cumulative `<name>.count` / `<name>.sum` plus gauge `<name>.min` /
    /// `<name>.max` from the last completed window, when one exists.
    pub fn datapoints(&self) -> Vec<Datapoint> {
        let mut window = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        window.rotate_if_due(self.width);

        let mut datapoints = vec![
            Datapoint::cumulative(
                format!("{}.count", self.name),
                self.dimensions.clone(),
                window.count as i64,
            ),
            Datapoint::cumulative(
                format!("{}.sum", self.name),
                self.dimensions.clone(),
                window.sum,
            ),
        ];
        if let Some(min) = window.last_min {
            datapoints.push(Datapoint::gauge(
                format!("{}.min", self.name),
                self.dimensions.clone(),
                min,
            ));
        }
        if let Some(max) = window.last_max {
            datapoints.push(Datapoint::gauge(
                format!("{}.max", self.name),
                self.dimensions.clone(),
                max,
            ));
        }
        datapoints
    }
}
