//! Transport error taxonomy
//!
//! The sink's retry policy is driven entirely by these variants: it extracts
//! an HTTP status where one exists and treats everything else as
//! unclassifiable.

use thiserror::Error;

/// Errors returned by a [`Transport`](crate::Transport) send
#[derive(Debug, Error)]
pub enum TransportError {
    /// The ingest service answered with a non-2xx status
    #[error("ingest API returned HTTP {status}: {message}")]
    Api {
        /// HTTP status code from the response
        status: u16,
        /// Response body, possibly truncated
        message: String,
    },

    /// The ingest service is rate limiting this token
    ///
    /// Always wraps the underlying response error, so status classification
    /// can unwrap to it.
    #[error("ingest API rate limited the request")]
    TooManyRequests {
        /// Parsed `Retry-After` header, in seconds
        retry_after: Option<u64>,
        /// The response error behind the rate limit
        #[source]
        source: Box<TransportError>,
    },

    /// The request never produced an HTTP response (connect failure,
    /// request timeout, connection reset)
    #[error("network error: {0}")]
    Network(String),

    /// The batch could not be encoded into a request body
    #[error("failed to encode batch: {0}")]
    Body(String),
}

impl TransportError {
    /// The HTTP status carried by this error, if one exists
    ///
    /// Rate-limit errors report the status of the wrapped response error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::TooManyRequests { source, .. } => source.status(),
            _ => None,
        }
    }
}
