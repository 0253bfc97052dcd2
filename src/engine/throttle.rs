//! Fetch Throttle
//!
//! Keeps the engine inside the bridge API's rate budget:
//! - identical consecutive amounts are ignored
//! - after the first request of a session, a new search needs
//!   `min_interval` since the last completed one
//!
//! Dropped requests are not queued; the caller re-issues later.

use std::time::Duration;
use tokio::time::Instant;

/// Minimum time between two completed searches
pub const MIN_FETCH_INTERVAL_MS: u64 = 15_000;

#[derive(Debug)]
pub struct FetchThrottle {
    min_interval: Duration,
    last_fetch: Option<Instant>,
    last_amount: Option<String>,
    has_requested: bool,
}

impl FetchThrottle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_fetch: None,
            last_amount: None,
            has_requested: false,
        }
    }

    /// Same amount as the last one admitted
    pub fn is_duplicate(&self, amount: &str) -> bool {
        self.last_amount.as_deref() == Some(amount)
    }

    /// Remember `amount` as the latest admitted request
    pub fn note_amount(&mut self, amount: &str) {
        self.last_amount = Some(amount.to_string());
        self.has_requested = true;
    }

    /// Forget the last amount so it can be requested again (route changed)
    pub fn clear_last_amount(&mut self) {
        self.last_amount = None;
    }

    /// Time left before another search may start; `None` if allowed now
    pub fn cooldown_remaining(&self) -> Option<Duration> {
        if !self.has_requested {
            return None;
        }
        let elapsed = self.last_fetch?.elapsed();
        if elapsed < self.min_interval {
            Some(self.min_interval - elapsed)
        } else {
            None
        }
    }

    /// Mark a search (or its fallback) as completed now
    pub fn record_fetch(&mut self) {
        self.last_fetch = Some(Instant::now());
    }
}

impl Default for FetchThrottle {
    fn default() -> Self {
        Self::new(Duration::from_millis(MIN_FETCH_INTERVAL_MS))
    }
}
