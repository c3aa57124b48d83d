//! Sliding-window admission control keyed by provider and operation.

use dashmap::DashMap;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// Per-key sliding-window rate limiter.
///
/// Each admission decision walks purge, count, append while holding the
/// key's map entry, so concurrent callers sharing a key observe a total
/// order of decisions. Different keys do not contend beyond map shards.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    max_requests: usize,
    window: Duration,
    requests: DashMap<String, VecDeque<Instant>>,
}

impl SlidingWindowLimiter {
    /// Create a limiter admitting `max_requests` per `window` per key
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            requests: DashMap::new(),
        }
    }

    /// Admit or reject a request for `key` at the current instant.
    ///
    /// Rejects are idempotent: beyond dropping expired timestamps they
    /// leave the key's state untouched.
    pub fn try_acquire(&self, key: &str) -> bool {
        // A zero budget admits nothing; don't create state for the key.
        if self.max_requests == 0 {
            return false;
        }
        let now = Instant::now();
        let mut timestamps = self.requests.entry(key.to_string()).or_default();

        // The window is inclusive: an entry exactly one window old still counts.
        while let Some(oldest) = timestamps.front() {
            if now.duration_since(*oldest) > self.window {
                timestamps.pop_front();
            } else {
                break;
            }
        }

        if timestamps.len() >= self.max_requests {
            return false;
        }

        timestamps.push_back(now);
        true
    }

    /// Number of keys currently tracked
    pub fn active_keys(&self) -> usize {
        self.requests.len()
    }

    /// Drop all admission state
    pub fn clear(&self) {
        self.requests.clear();
    }
}
