//! Transport trait
//!
//! One implementation per record kind on the transport type. The sink's
//! workers are generic over `Transport<R>`, which is what lets the batching
//! pipeline run unchanged for datapoints, events, and spans, and what lets
//! tests substitute a recording transport.

use async_trait::async_trait;
use funnel_protocol::Token;

use crate::TransportError;

/// Sends single-token batches of one record kind to the ingest service
///
/// # Contract
///
/// - The batch is sent under exactly the given token.
/// - A send may be repeated with an identical batch when the sink retries;
///   implementations must tolerate duplicates or be idempotent.
/// - `Ok(())` means the service acknowledged the batch with a 2xx status.
#[async_trait]
pub trait Transport<R: Send + Sync>: Send + Sync {
    /// Send one batch of records under one token
    async fn send_batch(&self, token: &Token, batch: &[R]) -> Result<(), TransportError>;
}
