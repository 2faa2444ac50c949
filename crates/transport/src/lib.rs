//! Funnel - Transport
//!
//! The seam between the funnel sink and the ingest service.
//!
//! # Design
//!
//! The sink core never talks HTTP directly. It drives a [`Transport`]
//! implementation, one per worker, and classifies the [`TransportError`]
//! values that come back. This crate provides:
//!
//! - [`Transport`] - the per-record-kind async send trait
//! - [`TransportError`] - the error taxonomy the sink's retry policy keys on
//! - [`TransportConfig`] - endpoint/user-agent/timeout knobs
//! - [`HttpTransport`] - the production implementation: JSON over HTTP with
//!   the tenant token in the [`TOKEN_HEADER_NAME`] header
//!
//! # Example
//!
//! ```ignore
//! use funnel_transport::{HttpTransport, Transport, TransportConfig};
//! use funnel_protocol::{Datapoint, Token};
//!
//! let transport = HttpTransport::new(TransportConfig::default());
//! let token = Token::new("org-a-ingest");
//! transport.send_batch(&token, &batch).await?;
//! ```

mod config;
mod error;
pub mod endpoint;
mod http;
mod traits;

pub use config::{TransportConfig, DEFAULT_REQUEST_TIMEOUT, DEFAULT_USER_AGENT};
pub use error::TransportError;
pub use http::HttpTransport;
pub use traits::Transport;

// Re-export the header name so transport users need not depend on the
// protocol crate for it.
pub use funnel_protocol::TOKEN_HEADER_NAME;
