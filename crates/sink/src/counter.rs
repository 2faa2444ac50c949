//! Per-token flush outcome counters
//!
//! Each record kind owns one `TokenStatusCounter`: a map of
//! token -> HTTP status -> record count, owned by a single serializer task.
//! Workers push increments through a bounded queue; snapshot reads go
//! through a request queue answered from the task's own state, so a
//! snapshot is always internally consistent.

use std::collections::{BTreeMap, HashMap};

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use funnel_protocol::{Datapoint, Token};

use crate::status::status_phrase;

/// Snapshot request queue depth; requests beyond this return empty
const REQUEST_QUEUE_CAPACITY: usize = 64;

/// One flush outcome to fold into the counter
struct TokenStatus {
    token: Token,
    status: i32,
    val: i64,
}

/// Handle to one kind's counter task
///
/// Cheap to clone; one clone per worker plus one held by the stats surface.
#[derive(Clone)]
pub(crate) struct CounterHandle {
    input: mpsc::Sender<TokenStatus>,
    requests: mpsc::Sender<oneshot::Sender<Vec<Datapoint>>>,
    stop: CancellationToken,
}

impl CounterHandle {
    /// Fold one (token, status, count) outcome into the counter
    ///
    /// Non-blocking: when the input queue is full the increment is dropped
    /// silently, keeping workers live under extreme overload. The sink's
    /// atomic retry counter stays authoritative for retry volume.
    pub fn increment(&self, token: Token, status: i32, val: i64) {
        if self.stop.is_cancelled() {
            return;
        }
        let _ = self.input.try_send(TokenStatus { token, status, val });
    }

    /// Snapshot the counter as cumulative datapoints
    ///
    /// Returns an empty sequence once the counter is stopped or when the
    /// request queue is saturated.
    pub async fn datapoints(&self) -> Vec<Datapoint> {
        if self.stop.is_cancelled() {
            return Vec::new();
        }
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.requests.try_send(reply_tx).is_err() {
            return Vec::new();
        }
        reply_rx.await.unwrap_or_default()
    }

    /// Stop the serializer task
    pub fn stop(&self) {
        self.stop.cancel();
    }
}

/// The serializer task's exclusive state
pub(crate) struct TokenStatusCounter {
    name: &'static str,
    data: HashMap<Token, HashMap<i32, i64>>,
    default_dims: BTreeMap<String, String>,
}

impl TokenStatusCounter {
    /// Spawn a counter task and return its handle
    ///
    /// `capacity` bounds the increment queue; sized to the worker count so
    /// every worker can have an increment in flight.
    pub fn spawn(
        name: &'static str,
        capacity: usize,
        default_dims: BTreeMap<String, String>,
    ) -> CounterHandle {
        let (input_tx, mut input_rx) = mpsc::channel(capacity.max(1));
        let (request_tx, mut request_rx) =
            mpsc::channel::<oneshot::Sender<Vec<Datapoint>>>(REQUEST_QUEUE_CAPACITY);
        let stop = CancellationToken::new();

        let mut counter = Self {
            name,
            data: HashMap::new(),
            default_dims,
        };
        let task_stop = stop.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = task_stop.cancelled() => break,
                    msg = input_rx.recv() => match msg {
                        Some(status) => counter.apply(status),
                        None => break,
                    },
                    request = request_rx.recv() => match request {
                        Some(reply) => {
                            let _ = reply.send(counter.fetch());
                        }
                        None => break,
                    },
                }
            }
            debug!(counter = counter.name, "token status counter stopped");
        });

        CounterHandle {
            input: input_tx,
            requests: request_tx,
            stop,
        }
    }

    fn apply(&mut self, status: TokenStatus) {
        *self
            .data
            .entry(status.token)
            .or_default()
            .entry(status.status)
            .or_insert(0) += status.val;
    }

    fn fetch(&self) -> Vec<Datapoint> {
        let mut datapoints = Vec::new();
        for (token, statuses) in &self.data {
            for (status, count) in statuses {
                let mut dims = self.default_dims.clone();
                dims.insert("token".to_string(), token.as_str().to_string());
                dims.insert("status".to_string(), status_phrase(*status).to_string());
                datapoints.push(Datapoint::cumulative(self.name, dims, *count));
            }
        }
        datapoints
    }
}
