//! Token-sharded submission routing
//!
//! `ShardedSubmitter` hashes a tenant token to one of C bounded shard
//! queues and enqueues without blocking. All of a token's traffic lands on
//! one shard, which is what lets the draining workers coalesce it into
//! large single-token batches.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use crossfire::{MAsyncTx, TrySendError};
use tokio_util::sync::CancellationToken;

use funnel_protocol::Token;

use crate::error::SubmitError;

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1a
///
/// Pure and allocation-free, so shard selection needs no shared hasher
/// state. Stable across processes: the same token always lands on the same
/// shard for a given shard count.
pub(crate) fn fnv1a_32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u32::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

/// One (token, records) message consumed by exactly one worker
#[derive(Debug)]
pub(crate) struct TokenBatch<R> {
    pub token: Token,
    pub records: Vec<R>,
}

/// Sharded, non-blocking submission side of one record-kind pipeline
pub(crate) struct ShardedSubmitter<R> {
    shards: Vec<MAsyncTx<TokenBatch<R>>>,
    closing: CancellationToken,
    buffered: Arc<AtomicI64>,
}

impl<R: Send + Unpin + 'static> ShardedSubmitter<R> {
    /// Create a submitter over the given shard senders
    ///
    /// `buffered` is the kind's buffered-records gauge; it is incremented
    /// here on accept and decremented by workers on flush completion.
    pub fn new(
        shards: Vec<MAsyncTx<TokenBatch<R>>>,
        closing: CancellationToken,
        buffered: Arc<AtomicI64>,
    ) -> Self {
        Self {
            shards,
            closing,
            buffered,
        }
    }

    /// The shard index this token routes to
    #[inline]
    pub fn shard_for(&self, token: &Token) -> usize {
        (fnv1a_32(token.as_str().as_bytes()) as usize) % self.shards.len()
    }

    /// Try to enqueue a message without blocking
    ///
    /// On accept the buffered gauge grows by the record count. A full shard
    /// fails with [`SubmitError::QueueFull`] and changes nothing; the caller
    /// is expected to apply its own backpressure.
    pub fn try_submit(&self, token: Token, records: Vec<R>) -> Result<(), SubmitError> {
        if self.closing.is_cancelled() {
            return Err(SubmitError::Closed);
        }
        let shard = self.shard_for(&token);
        let count = records.len() as i64;
        match self.shards[shard].try_send(TokenBatch { token, records }) {
            Ok(()) => {
                self.buffered.fetch_add(count, Ordering::Relaxed);
                Ok(())
            }
            Err(TrySendError::Full(_)) => Err(SubmitError::QueueFull),
            Err(TrySendError::Disconnected(_)) => Err(SubmitError::Closed),
        }
    }
}
