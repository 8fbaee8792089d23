//! Cache Store Module
//!
//! Synchronous in-process cache engine: HashMap storage with per-entry TTL
//! and LRU eviction at capacity. Wrapped by `MemoryCache` for async use.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::cache::{CacheEntry, LruTracker, MAX_KEY_LENGTH, MAX_VALUE_SIZE};
use crate::error::CacheError;

// == Cache Store ==
#[derive(Debug)]
pub(crate) struct CacheStore {
    entries: HashMap<String, CacheEntry>,
    lru: LruTracker,
    max_entries: usize,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty store holding at most `max_entries` keys.
    pub(crate) fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            max_entries,
        }
    }

    // == Set ==
    /// Stores `value` under `key` for `ttl`, overwriting any previous entry.
    ///
    /// At capacity the least recently used key is evicted first.
    pub(crate) fn set(&mut self, key: String, value: String, ttl: Duration) -> Result<(), CacheError> {
        if key.is_empty() || key.len() > MAX_KEY_LENGTH {
            return Err(CacheError::InvalidRequest(format!(
                "Key must be 1..={} bytes",
                MAX_KEY_LENGTH
            )));
        }
        if value.len() > MAX_VALUE_SIZE {
            return Err(CacheError::InvalidRequest(format!(
                "Value exceeds maximum size of {} bytes",
                MAX_VALUE_SIZE
            )));
        }

        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            match self.lru.evict_oldest() {
                Some(evicted) => {
                    self.entries.remove(&evicted);
                }
                None => {
                    return Err(CacheError::CacheFull(
                        "Cache is full and eviction failed".to_string(),
                    ))
                }
            }
        }

        self.lru.touch(&key);
        self.entries.insert(key, CacheEntry::new(value, ttl));
        Ok(())
    }

    // == Get ==
    /// Returns the live value for `key`. Expired entries are dropped on read.
    pub(crate) fn get(&mut self, key: &str) -> Result<String, CacheError> {
        let expired = match self.entries.get(key) {
            None => return Err(CacheError::NotFound(key.to_string())),
            Some(entry) => entry.is_expired(),
        };

        if expired {
            self.remove(key);
            return Err(CacheError::Expired(key.to_string()));
        }

        self.lru.touch(key);
        self.entries
            .get(key)
            .map(|entry| entry.value.clone())
            .ok_or_else(|| CacheError::NotFound(key.to_string()))
    }

    // == Delete ==
    /// Removes `key`. Returns whether an entry was present.
    pub(crate) fn delete(&mut self, key: &str) -> bool {
        self.remove(key)
    }

    // == Keys With Prefix ==
    /// Lists live keys starting with `prefix`.
    pub(crate) fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(|(key, entry)| key.starts_with(prefix) && !entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    // == Cleanup Expired ==
    /// Drops every expired entry and returns how many were removed.
    pub(crate) fn cleanup_expired(&mut self) -> usize {
        let now = Instant::now();
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.remove(key);
        }
        expired.len()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn remove(&mut self, key: &str) -> bool {
        self.lru.remove(key);
        self.entries.remove(key).is_some()
    }
}
