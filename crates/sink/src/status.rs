//! Flush outcome classification
//!
//! Every flush outcome is reduced to one HTTP status code, which drives the
//! retry decision and the per-token status counters. Outcomes with no
//! extractable status get the [`STATUS_UNKNOWN`] sentinel.

use http::StatusCode;

use funnel_transport::TransportError;

/// Sentinel for outcomes with no extractable HTTP status
pub(crate) const STATUS_UNKNOWN: i32 = -1;

/// Non-standard "network read timeout" status some proxies emit
const STATUS_NETWORK_READ_TIMEOUT: i32 = 598;

/// Reduce a flush outcome to an HTTP status code
///
/// Rate-limit errors are unwrapped to the response error behind them, so a
/// 429 surfaces its own status rather than the wrapper's.
pub(crate) fn classify<T>(outcome: &Result<T, TransportError>) -> i32 {
    match outcome {
        Ok(_) => StatusCode::OK.as_u16() as i32,
        Err(err) => classify_error(err),
    }
}

fn classify_error(err: &TransportError) -> i32 {
    match err {
        TransportError::TooManyRequests { source, .. } => classify_error(source),
        TransportError::Api { status, .. } => i32::from(*status),
        _ => STATUS_UNKNOWN,
    }
}

/// Whether a flush with this terminal-candidate status should be retried
///
/// Retryable: request timeout, gateway timeout, network read timeout, and
/// anything unclassifiable. Everything else, 429 included, is terminal.
pub(crate) fn is_retryable(status: i32) -> bool {
    status == STATUS_UNKNOWN
        || status == StatusCode::REQUEST_TIMEOUT.as_u16() as i32
        || status == StatusCode::GATEWAY_TIMEOUT.as_u16() as i32
        || status == STATUS_NETWORK_READ_TIMEOUT
}

/// Canonical reason phrase for a status, `"unknown"` when none exists
pub(crate) fn status_phrase(status: i32) -> &'static str {
    u16::try_from(status)
        .ok()
        .and_then(|code| StatusCode::from_u16(code).ok())
        .and_then(|code| code.canonical_reason())
        .unwrap_or("unknown")
}
