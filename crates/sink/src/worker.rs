//! Draining worker
//!
//! One worker per shard per kind (times `num_draining_threads`). A worker
//! owns a private batch buffer and one transport instance; it drains its
//! shard's queue, assembles single-token batches up to `batch_size`, and
//! flushes them with bounded retry.

use std::sync::atomic::Ordering;

use crossfire::MAsyncRx;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use funnel_protocol::Token;
use funnel_transport::Transport;

use crate::router::TokenBatch;
use crate::sink::ErrorHandler;
use crate::stats::KindStats;
use crate::status::{classify, is_retryable};

pub(crate) struct Worker<R, T> {
    id: usize,
    transport: T,
    input: MAsyncRx<TokenBatch<R>>,
    buffer: Vec<R>,
    batch_size: usize,
    max_retry: usize,
    stats: KindStats,
    error_handler: ErrorHandler,
    closing: CancellationToken,
    done: mpsc::Sender<()>,
}

impl<R, T> Worker<R, T>
where
    R: Send + Sync + 'static,
    T: Transport<R>,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: usize,
        transport: T,
        input: MAsyncRx<TokenBatch<R>>,
        batch_size: usize,
        max_retry: usize,
        stats: KindStats,
        error_handler: ErrorHandler,
        closing: CancellationToken,
        done: mpsc::Sender<()>,
    ) -> Self {
        Self {
            id,
            transport,
            input,
            buffer: Vec::new(),
            batch_size,
            max_retry,
            stats,
            error_handler,
            closing,
            done,
        }
    }

    /// Run until shutdown
    ///
    /// The select is biased toward the input so a worker drains everything
    /// already queued on its shard before honoring the shutdown signal;
    /// shutdown is only observed while idle.
    pub async fn run(mut self) {
        debug!(worker = self.id, kind = self.stats.kind, "sink worker started");
        loop {
            tokio::select! {
                biased;
                msg = self.input.recv() => match msg {
                    Ok(batch) => self.drain(batch).await,
                    Err(_) => break,
                },
                _ = self.closing.cancelled() => break,
            }
        }
        debug!(worker = self.id, kind = self.stats.kind, "sink worker stopped");
        let _ = self.done.try_send(());
    }

    /// Consume one message, then opportunistically coalesce whatever else is
    /// already queued, flushing on batch-size and on token switches
    async fn drain(&mut self, msg: TokenBatch<R>) {
        let mut active_token = msg.token;
        self.append(msg.records, &active_token).await;

        loop {
            match self.input.try_recv() {
                Ok(next) => {
                    if next.token != active_token {
                        // A batch carries exactly one token; emit the old
                        // token's records before touching the new ones.
                        self.flush(&active_token).await;
                        active_token = next.token;
                    }
                    self.append(next.records, &active_token).await;
                }
                Err(_) => break,
            }
        }
        self.flush(&active_token).await;
    }

    /// Append records in chunks, flushing whenever the buffer fills
    async fn append(&mut self, records: Vec<R>, token: &Token) {
        let mut records = records.into_iter();
        loop {
            let room = self.batch_size - self.buffer.len();
            self.buffer.extend(records.by_ref().take(room));
            if self.buffer.len() >= self.batch_size {
                self.flush(token).await;
            }
            if records.len() == 0 {
                break;
            }
        }
    }

    /// Emit the buffer under the given token and account for the outcome
    async fn flush(&mut self, token: &Token) {
        if self.buffer.is_empty() {
            return;
        }
        let count = self.buffer.len();
        self.stats.batch_sizes.record(count as f64);

        let mut outcome = self.transport.send_batch(token, &self.buffer).await;
        let mut status = classify(&outcome);
        let mut attempt = 0;
        while attempt < self.max_retry && is_retryable(status) {
            attempt += 1;
            self.stats.retries.fetch_add(1, Ordering::Relaxed);
            trace!(
                worker = self.id,
                kind = self.stats.kind,
                attempt,
                status,
                "retrying batch flush"
            );
            // The buffer is untouched between attempts, so every retry
            // carries a batch identical to the first.
            outcome = self.transport.send_batch(token, &self.buffer).await;
            status = classify(&outcome);
        }

        self.stats.by_token.increment(token.clone(), status, count as i64);
        // Win or lose, the records leave the sink here.
        self.stats.buffered.fetch_sub(count as i64, Ordering::Relaxed);
        if let Err(err) = outcome {
            (self.error_handler)(&err);
        }
        self.buffer.clear();
    }
}
