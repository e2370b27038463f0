//! Single-flight memoization for fallible async lookups.
//!
//! Used for the organization identity, which costs one network round trip
//! and stays valid for the lifetime of a client. The first outcome for a
//! key, success or error, is cached permanently; callers wanting a fresh
//! retry construct a new [`Memoized`].

use crate::error::Result;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;

/// A key-to-outcome cache around a fallible resolver.
///
/// Each key owns a `tokio::sync::OnceCell`, so concurrent first lookups for
/// the same key run the resolver exactly once; later callers wait on the
/// in-flight resolution instead of racing it.
#[derive(Debug)]
pub struct Memoized<K, V> {
    entries: Mutex<HashMap<K, Arc<OnceCell<Result<V>>>>>,
}

impl<K, V> Default for Memoized<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Memoized<K, V> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V> Memoized<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Return the cached outcome for `key`, resolving it on first use.
    ///
    /// The resolver runs at most once per key, even under concurrent first
    /// access. A cached error is replayed verbatim on every repeat call.
    pub async fn get_or_resolve<F, Fut>(&self, key: K, resolve: F) -> Result<V>
    where
        F: FnOnce(K) -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        let cell = {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(
                entries
                    .entry(key.clone())
                    .or_insert_with(|| Arc::new(OnceCell::new())),
            )
        };
        cell.get_or_init(|| resolve(key)).await.clone()
    }

    /// Whether `key` has a settled outcome (does not count in-flight lookups).
    pub fn contains(&self, key: &K) -> bool {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).is_some_and(|cell| cell.initialized())
    }
}
