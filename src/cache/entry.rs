//! Cache Entry Module
//!
//! A stored value together with its expiry deadline.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// A serialized value held by the in-process cache.
#[derive(Debug, Clone)]
pub(crate) struct CacheEntry {
    /// Serialized JSON payload
    pub(crate) value: String,
    /// Instant after which the entry counts as absent
    pub(crate) expires_at: Instant,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry that expires `ttl` from now.
    pub(crate) fn new(value: String, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    // == Is Expired ==
    /// An entry is expired once the current time reaches its deadline, so a
    /// zero TTL produces an entry that is never served.
    pub(crate) fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Expiry check against a caller-supplied clock reading.
    pub(crate) fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    /// Time left before expiry, zero once expired.
    #[cfg(test)]
    fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}
