//! LRU Tracker Module
//!
//! Access-order bookkeeping used to pick eviction victims when the
//! in-process cache is at capacity.

use std::collections::{BTreeMap, HashMap};

// == LRU Tracker ==
/// Orders keys by a monotonically increasing access tick. The smallest
/// tick is the least recently used key.
#[derive(Debug, Default)]
pub(crate) struct LruTracker {
    clock: u64,
    by_tick: BTreeMap<u64, String>,
    ticks: HashMap<String, u64>,
}

impl LruTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Marks a key as most recently used, inserting it if unseen.
    pub(crate) fn touch(&mut self, key: &str) {
        if let Some(old) = self.ticks.remove(key) {
            self.by_tick.remove(&old);
        }
        self.clock += 1;
        self.by_tick.insert(self.clock, key.to_string());
        self.ticks.insert(key.to_string(), self.clock);
    }

    // == Remove ==
    pub(crate) fn remove(&mut self, key: &str) {
        if let Some(tick) = self.ticks.remove(key) {
            self.by_tick.remove(&tick);
        }
    }

    // == Evict Oldest ==
    /// Removes and returns the least recently used key.
    pub(crate) fn evict_oldest(&mut self) -> Option<String> {
        let (_, key) = self.by_tick.pop_first()?;
        self.ticks.remove(&key);
        Some(key)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.ticks.len()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }
}
