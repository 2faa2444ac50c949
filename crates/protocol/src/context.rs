//! Submission context
//!
//! `Context` carries per-submission metadata through call sites that do not
//! want to thread a token parameter explicitly. The sink's context-carrying
//! submission forms read the tenant token from [`TOKEN_CTX_KEY`].

use std::collections::HashMap;

/// HTTP header carrying the tenant token on every ingest request
pub const TOKEN_HEADER_NAME: &str = "X-Funnel-Token";

/// Context key under which submission forms look for the tenant token
///
/// Deliberately the same string as [`TOKEN_HEADER_NAME`], so middleware that
/// copies inbound headers into a `Context` forwards the token unchanged.
pub const TOKEN_CTX_KEY: &str = TOKEN_HEADER_NAME;

/// String-keyed value bag attached to a submission
///
/// # Example
///
/// ```
/// use funnel_protocol::{Context, TOKEN_CTX_KEY};
///
/// let ctx = Context::with_token("org-a-ingest");
/// assert_eq!(ctx.get(TOKEN_CTX_KEY), Some("org-a-ingest"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    values: HashMap<String, String>,
}

impl Context {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context carrying the given token under [`TOKEN_CTX_KEY`]
    pub fn with_token(token: impl Into<String>) -> Self {
        let mut ctx = Self::new();
        ctx.insert(TOKEN_CTX_KEY, token);
        ctx
    }

    /// Insert a value, replacing any previous value under the same key
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Look up a value by key
    #[inline]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// The token under [`TOKEN_CTX_KEY`], if present
    #[inline]
    pub fn token(&self) -> Option<&str> {
        self.get(TOKEN_CTX_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip() {
        let ctx = Context::with_token("abc");
        assert_eq!(ctx.token(), Some("abc"));
        assert_eq!(ctx.get(TOKEN_CTX_KEY), Some("abc"));
    }

    #[test]
    fn test_missing_token() {
        let ctx = Context::new();
        assert_eq!(ctx.token(), None);
    }

    #[test]
    fn test_ctx_key_matches_header() {
        assert_eq!(TOKEN_CTX_KEY, TOKEN_HEADER_NAME);
    }

    #[test]
    fn test_insert_replaces() {
        let mut ctx = Context::with_token("old");
        ctx.insert(TOKEN_CTX_KEY, "new");
        assert_eq!(ctx.token(), Some("new"));
    }
}
