//! Sequence issuance on top of an external atomic counter.
//!
//! Counters are globally shared and must only ever move through the atomic
//! increment primitive; the generator never caches a counter value locally,
//! so duplicate issuance under concurrent callers is impossible. Gaps (from
//! requests that failed after incrementing) are acceptable.

use std::sync::Arc;
use std::time::Duration;

use crate::error::LedgerResult;

/// Counter scope for split ids.
pub const SPLIT_ID_SCOPE: &str = "splitIdCounter";

/// Counter scope for account numbers minted under a category.
pub fn category_scope(category_code: &str) -> String {
    format!("category_code_{category_code}_seq")
}

/// Atomic counter / cache collaborator.
///
/// `increment` is the only way a counter value may change; read-modify-write
/// outside of it is forbidden. The `get`/`set`/`delete` surface doubles as
/// the listing cache used for invalidation after writes. Unreachable cache
/// surfaces as [`LedgerError::Infrastructure`], never a silent default.
///
/// [`LedgerError::Infrastructure`]: crate::error::LedgerError::Infrastructure
pub trait CounterCache: Send + Sync {
    /// Atomically increment the counter at `key` and return the new value.
    fn increment(&self, key: &str) -> LedgerResult<u64>;

    fn get(&self, key: &str) -> LedgerResult<Option<String>>;

    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> LedgerResult<()>;

    fn delete(&self, keys: &[&str]) -> LedgerResult<()>;

    fn delete_by_prefix(&self, prefix: &str) -> LedgerResult<()>;
}

impl<C> CounterCache for Arc<C>
where
    C: CounterCache + ?Sized,
{
    fn increment(&self, key: &str) -> LedgerResult<u64> {
        (**self).increment(key)
    }

    fn get(&self, key: &str) -> LedgerResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> LedgerResult<()> {
        (**self).set(key, value, ttl)
    }

    fn delete(&self, keys: &[&str]) -> LedgerResult<()> {
        (**self).delete(keys)
    }

    fn delete_by_prefix(&self, prefix: &str) -> LedgerResult<()> {
        (**self).delete_by_prefix(prefix)
    }
}

/// Issues monotonic, gap-tolerant sequences per scope.
#[derive(Clone)]
pub struct SequenceGenerator {
    cache: Arc<dyn CounterCache>,
}

impl SequenceGenerator {
    pub fn new(cache: Arc<dyn CounterCache>) -> Self {
        Self { cache }
    }

    /// Next value for `scope`. Duplicate issuance is impossible; failure is
    /// retryable.
    pub fn next(&self, scope: &str) -> LedgerResult<u64> {
        self.cache.increment(scope)
    }

    pub fn cache(&self) -> &Arc<dyn CounterCache> {
        &self.cache
    }
}

impl core::fmt::Debug for SequenceGenerator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SequenceGenerator").finish_non_exhaustive()
    }
}
