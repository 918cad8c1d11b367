//! # Idempotency Cache
//!
//! Maps a client-supplied token to the reply its first creation request
//! produced, so retries replay that reply byte-for-byte.
//!
//! Entries are written put-if-absent, never mutated, never evicted and
//! never persisted: the cache lives as long as the process.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// A fully rendered response: status, body bytes and optional location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub body: Vec<u8>,
    /// Value for a `Location` header, if any.
    pub location: Option<String>,
}

/// Body shape of every error reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody<'a> {
    pub status: u16,
    pub message: &'a str,
}

impl Reply {
    /// A reply whose body is `value` rendered as JSON.
    pub fn json<T: Serialize>(status: u16, value: &T) -> Result<Self, crate::CatalogError> {
        let body = serde_json::to_vec(value)
            .map_err(|e| crate::CatalogError::Serialization(e.to_string()))?;
        Ok(Self {
            status,
            body,
            location: None,
        })
    }

    /// A `{status, message}` error reply.
    pub fn error(status: u16, message: &str) -> Result<Self, crate::CatalogError> {
        Self::json(status, &ErrorBody { status, message })
    }

    /// Attach a `Location` header value.
    #[must_use]
    pub fn with_location(mut self, location: String) -> Self {
        self.location = Some(location);
        self
    }
}

/// Normalize a raw token: missing or blank disables idempotency.
#[must_use]
pub fn normalize_token(raw: Option<&str>) -> Option<&str> {
    raw.filter(|token| !token.trim().is_empty())
}

/// Key-value store of replies by token.
///
/// Implementations must make `lookup` and `record` atomic per token.
pub trait IdempotencyStore: Send + Sync {
    /// The reply recorded for `token`, if any.
    fn lookup(&self, token: &str) -> Option<Reply>;

    /// Record `reply` for `token` unless one is already recorded.
    ///
    /// Returns `true` if this call stored the reply.
    fn record(&self, token: &str, reply: &Reply) -> bool;

    /// Number of recorded tokens.
    fn len(&self) -> usize;

    /// Whether no token has been recorded.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local idempotency store.
#[derive(Debug, Default)]
pub struct MemoryIdempotencyStore {
    replies: Mutex<BTreeMap<String, Reply>>,
}

impl MemoryIdempotencyStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdempotencyStore for MemoryIdempotencyStore {
    fn lookup(&self, token: &str) -> Option<Reply> {
        // A poisoned lock still holds a consistent map: entries are only
        // ever inserted whole.
        let replies = self.replies.lock().unwrap_or_else(|e| e.into_inner());
        replies.get(token).cloned()
    }

    fn record(&self, token: &str, reply: &Reply) -> bool {
        let mut replies = self.replies.lock().unwrap_or_else(|e| e.into_inner());
        if replies.contains_key(token) {
            return false;
        }
        replies.insert(token.to_string(), reply.clone());
        true
    }

    fn len(&self) -> usize {
        self.replies.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
