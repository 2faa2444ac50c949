//! Funnel - Protocol
//!
//! Telemetry record types shared by the funnel sink and its transports.
//!
//! # Record Kinds
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`Datapoint`] | A single metric observation (gauge, cumulative, counter) |
//! | [`Event`] | A discrete occurrence with free-form properties |
//! | [`Span`] | One operation in a distributed trace |
//!
//! Records are plain serde-serializable data. The sink treats their payloads
//! as opaque; only the [`Token`] attached at submission time matters for
//! routing and authentication.
//!
//! # Submission Context
//!
//! [`Context`] is a string-keyed value bag used by the context-carrying
//! submission forms. Callers place the tenant token under [`TOKEN_CTX_KEY`],
//! which has the same string value as the transport header
//! [`TOKEN_HEADER_NAME`].

mod context;
mod datapoint;
mod event;
mod span;
mod token;

pub use context::{Context, TOKEN_CTX_KEY, TOKEN_HEADER_NAME};
pub use datapoint::{Datapoint, MetricType, MetricValue};
pub use event::Event;
pub use span::{Span, SpanKind};
pub use token::Token;
