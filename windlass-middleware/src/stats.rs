//! Retry accounting shared across concurrent executions.

use dashmap::DashMap;
use std::collections::HashMap;

/// Monotonic per-key retry counters.
///
/// Counts only ever grow; `clear` is the single reset point.
#[derive(Debug, Default)]
pub struct RetryCounters {
    counts: DashMap<String, u64>,
}

impl RetryCounters {
    /// Create an empty counter map
    pub fn new() -> Self {
        Self {
            counts: DashMap::new(),
        }
    }

    /// Add one consumed retry for `key`
    pub fn record(&self, key: &str) {
        *self.counts.entry(key.to_string()).or_insert(0) += 1;
    }

    /// Copy of the per-key counts
    pub fn snapshot(&self) -> HashMap<String, u64> {
        self.counts
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }

    /// Drop all counters
    pub fn clear(&self) {
        self.counts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_record_accumulates_per_key() {
        let counters = RetryCounters::new();
        counters.record("ollama:generate");
        counters.record("ollama:generate");
        counters.record("openai:generate");

        let snapshot = counters.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot["ollama:generate"], 2);
        assert_eq!(snapshot["openai:generate"], 1);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let counters = RetryCounters::new();
        counters.record("k");
        let snapshot = counters.snapshot();
        counters.record("k");
        assert_eq!(snapshot["k"], 1);
        assert_eq!(counters.snapshot()["k"], 2);
    }

    #[test]
    fn test_clear_empties_everything() {
        let counters = RetryCounters::new();
        counters.record("k");
        counters.clear();
        assert!(counters.snapshot().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_records_are_not_lost() {
        let counters = Arc::new(RetryCounters::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let counters = counters.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..100 {
                    counters.record("shared:generate");
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(counters.snapshot()["shared:generate"], 800);
    }
}
