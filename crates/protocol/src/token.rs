//! Tenant token type
//!
//! `Token` identifies the tenant a batch of records belongs to. It is both
//! the routing key (hashed to pick a shard) and the transport credential
//! (sent in the token header on every flush).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque tenant credential
///
/// The sink never inspects the token beyond hashing it for shard selection;
/// the transport forwards it verbatim in the token header.
///
/// # Example
///
/// ```
/// use funnel_protocol::Token;
///
/// let token = Token::new("org-a-ingest");
/// assert_eq!(token.as_str(), "org-a-ingest");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token(String);

impl Token {
    /// Create a new token
    #[inline]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Get the token as a string slice
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the token is the empty string
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Token {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Token {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
