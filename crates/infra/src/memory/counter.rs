//! In-memory atomic counter / cache.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use ledgerpost_core::{CounterCache, LedgerError, LedgerResult};

/// Counter + key-value cache backed by process memory.
///
/// Counters only move through `increment`, matching the shared-counter
/// contract. Increments can be failed on demand to exercise the retryable
/// error path.
#[derive(Debug, Default)]
pub struct InMemoryCounterCache {
    counters: Mutex<HashMap<String, u64>>,
    values: Mutex<HashMap<String, (String, Option<Instant>)>>,
    fail_increments: AtomicBool,
}

impl InMemoryCounterCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `increment` fail until restored.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.fail_increments.store(unreachable, Ordering::SeqCst);
    }

    /// Current counter value without incrementing (test inspection only).
    pub fn peek(&self, key: &str) -> Option<u64> {
        self.counters.lock().unwrap().get(key).copied()
    }
}

impl CounterCache for InMemoryCounterCache {
    fn increment(&self, key: &str) -> LedgerResult<u64> {
        if self.fail_increments.load(Ordering::SeqCst) {
            return Err(LedgerError::infrastructure("counter cache unreachable"));
        }
        let mut counters = self.counters.lock().unwrap();
        let value = counters.entry(key.to_string()).or_insert(0);
        *value += 1;
        Ok(*value)
    }

    fn get(&self, key: &str) -> LedgerResult<Option<String>> {
        let mut values = self.values.lock().unwrap();
        match values.get(key) {
            Some((_, Some(expiry))) if *expiry <= Instant::now() => {
                values.remove(key);
                Ok(None)
            }
            Some((value, _)) => Ok(Some(value.clone())),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> LedgerResult<()> {
        let expiry = ttl.map(|ttl| Instant::now() + ttl);
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), (value.to_string(), expiry));
        Ok(())
    }

    fn delete(&self, keys: &[&str]) -> LedgerResult<()> {
        let mut values = self.values.lock().unwrap();
        for key in keys {
            values.remove(*key);
        }
        Ok(())
    }

    fn delete_by_prefix(&self, prefix: &str) -> LedgerResult<()> {
        self.values
            .lock()
            .unwrap()
            .retain(|key, _| !key.starts_with(prefix));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increment_is_monotonic_per_key() {
        let cache = InMemoryCounterCache::new();
        assert_eq!(cache.increment("a").unwrap(), 1);
        assert_eq!(cache.increment("a").unwrap(), 2);
        assert_eq!(cache.increment("b").unwrap(), 1);
    }

    #[test]
    fn unreachable_counter_surfaces_a_retryable_error() {
        let cache = InMemoryCounterCache::new();
        cache.set_unreachable(true);
        assert!(cache.increment("a").unwrap_err().is_retryable());
        cache.set_unreachable(false);
        assert_eq!(cache.increment("a").unwrap(), 1);
    }

    #[test]
    fn expired_values_read_as_absent() {
        let cache = InMemoryCounterCache::new();
        cache
            .set("k", "v", Some(Duration::from_nanos(1)))
            .unwrap();
        std::thread::sleep(Duration::from_millis(2));
        assert_eq!(cache.get("k").unwrap(), None);
    }

    #[test]
    fn delete_by_prefix_clears_matching_keys_only() {
        let cache = InMemoryCounterCache::new();
        cache.set("accounts_owner_1", "x", None).unwrap();
        cache.set("accounts_owner_2", "y", None).unwrap();
        cache.set("other", "z", None).unwrap();
        cache.delete_by_prefix("accounts_owner_").unwrap();
        assert_eq!(cache.get("accounts_owner_1").unwrap(), None);
        assert_eq!(cache.get("other").unwrap().as_deref(), Some("z"));
    }
}
