//! Quote Cache
//!
//! Time-boxed cache of finished quotes keyed by route + send amount.
//!
//! - An entry is usable while it is younger than the TTL
//! - Expired entries are not purged; they just read as misses
//! - At capacity the oldest-INSERTED key is evicted (FIFO, not LRU).
//!   Reads never change eviction order.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::quote::Quote;

// ============================================
// CONSTANTS
// ============================================

/// How long a cached quote stays usable
pub const CACHE_TTL_MS: u64 = 15_000;

/// Maximum number of cached quotes
pub const CACHE_CAPACITY: usize = 20;

// ============================================
// CACHE ENTRY
// ============================================

#[derive(Debug, Clone)]
struct CacheEntry {
    quote: Quote,
    inserted_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.inserted_at.elapsed() < ttl
    }
}

// ============================================
// QUOTE CACHE
// ============================================

pub struct QuoteCache {
    ttl: Duration,
    capacity: usize,
    entries: HashMap<String, CacheEntry>,
    /// Keys in insertion order, front = oldest
    order: VecDeque<String>,
}

impl QuoteCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity: capacity.max(1),
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
        }
    }

    /// Fresh quote for `key`, if any
    pub fn get(&self, key: &str) -> Option<&Quote> {
        let entry = self.entries.get(key)?;
        if entry.is_fresh(self.ttl) {
            trace!("Quote cache hit: {}", key);
            Some(&entry.quote)
        } else {
            trace!("Quote cache entry expired: {}", key);
            None
        }
    }

    /// Store a quote. An existing key is overwritten in place and keeps its
    /// insertion position; a new key at capacity evicts the oldest key.
    pub fn insert(&mut self, key: String, quote: Quote) {
        let entry = CacheEntry {
            quote,
            inserted_at: Instant::now(),
        };

        if let Some(existing) = self.entries.get_mut(&key) {
            *existing = entry;
            return;
        }

        while self.entries.len() >= self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                    debug!("Evicted oldest cached quote: {}", oldest);
                }
                None => break,
            }
        }

        self.order.push_back(key.clone());
        self.entries.insert(key, entry);
    }

    /// Number of stored entries, expired ones included
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

impl Default for QuoteCache {
    fn default() -> Self {
        Self::new(Duration::from_millis(CACHE_TTL_MS), CACHE_CAPACITY)
    }
}

// ============================================
// TESTS
// ============================================
