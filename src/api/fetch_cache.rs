use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::core::{TimeBucket, TimeScale, TimeWindow};

/// Runtime metrics exposed by the window cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub expired: u64,
    pub size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) struct WindowCacheKey {
    scale: TimeScale,
    start_millis: i64,
    end_millis: i64,
}

impl WindowCacheKey {
    pub(super) fn new(window: TimeWindow, scale: TimeScale) -> Self {
        Self {
            scale,
            start_millis: window.start().timestamp_millis(),
            end_millis: window.end().timestamp_millis(),
        }
    }
}

#[derive(Debug)]
struct CachedBuckets {
    buckets: Vec<TimeBucket>,
    stored_at: Instant,
}

/// Window+scale keyed bucket cache. Entries only leave through TTL expiry
/// (or a wholesale clear when the entry cap is reached).
#[derive(Debug)]
pub(super) struct WindowCache {
    entries: HashMap<WindowCacheKey, CachedBuckets>,
    ttl: Duration,
    max_entries: usize,
    hits: u64,
    misses: u64,
    expired: u64,
}

impl WindowCache {
    pub(super) fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            max_entries: max_entries.max(1),
            hits: 0,
            misses: 0,
            expired: 0,
        }
    }

    pub(super) fn get(&mut self, key: WindowCacheKey, now: Instant) -> Option<Vec<TimeBucket>> {
        let fresh = match self.entries.get(&key) {
            Some(entry) => now.saturating_duration_since(entry.stored_at) < self.ttl,
            None => {
                self.misses = self.misses.saturating_add(1);
                return None;
            }
        };

        if !fresh {
            self.entries.remove(&key);
            self.expired = self.expired.saturating_add(1);
            self.misses = self.misses.saturating_add(1);
            return None;
        }

        self.hits = self.hits.saturating_add(1);
        self.entries.get(&key).map(|entry| entry.buckets.clone())
    }

    pub(super) fn insert(&mut self, key: WindowCacheKey, buckets: Vec<TimeBucket>, now: Instant) {
        if self.ttl.is_zero() {
            return;
        }
        if self.entries.len() >= self.max_entries && !self.entries.contains_key(&key) {
            let ttl = self.ttl;
            self.entries
                .retain(|_, entry| now.saturating_duration_since(entry.stored_at) < ttl);
            if self.entries.len() >= self.max_entries {
                self.entries.clear();
            }
        }
        self.entries.insert(
            key,
            CachedBuckets {
                buckets,
                stored_at: now,
            },
        );
    }

    pub(super) fn stats(&self) -> WindowCacheStats {
        WindowCacheStats {
            hits: self.hits,
            misses: self.misses,
            expired: self.expired,
            size: self.entries.len(),
        }
    }
}
