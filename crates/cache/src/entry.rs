//! Cached payload with the time it was stored

use serde::{Deserialize, Serialize};

/// A cached value and the time it was written.
///
/// Entries are replaced whole; nothing updates the payload or the timestamp
/// on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub data: T,
    pub last_updated_at_ms: u64,
}

impl<T> CacheEntry<T> {
    pub fn new(data: T, last_updated_at_ms: u64) -> Self {
        Self {
            data,
            last_updated_at_ms,
        }
    }

    /// Milliseconds since the entry was written, zero if `now_ms` is earlier
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_updated_at_ms)
    }

    /// Whether the entry is younger than `ttl_ms`
    pub fn is_fresh(&self, now_ms: u64, ttl_ms: u64) -> bool {
        self.age_ms(now_ms) < ttl_ms
    }
}
