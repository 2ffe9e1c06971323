// =============================================================================
// Fetch Cache — keyed memo store with manual invalidation
// =============================================================================
//
// Fetch results are memoized by key so that repeated screener refreshes and
// chart-detail requests within one run do not re-hit the upstream sources.
// Invalidation is manual (`invalidate` / `clear`); there is no TTL.

use std::collections::HashMap;
use std::hash::Hash;

use parking_lot::RwLock;

use crate::types::Period;

/// Composite key identifying one cached price-history fetch.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct PriceKey {
    pub ticker: String,
    pub period: Period,
}

impl std::fmt::Display for PriceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.ticker, self.period)
    }
}

/// Key → result memo store guarded by a `parking_lot::RwLock`.
///
/// The screener itself runs sequentially; the lock exists because the API
/// server shares the same store across tasks.
pub struct FetchCache<K, V> {
    entries: RwLock<HashMap<K, V>>,
}

impl<K: Eq + Hash + Clone, V: Clone> FetchCache<K, V> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Cloned value for `key`, if present.
    pub fn get(&self, key: &K) -> Option<V> {
        self.entries.read().get(key).cloned()
    }

    /// Store (or replace) the value for `key`.
    pub fn insert(&self, key: K, value: V) {
        self.entries.write().insert(key, value);
    }

    /// Remove a single entry.
    pub fn invalidate(&self, key: &K) {
        self.entries.write().remove(key);
    }

    /// Drop every entry. Called before a forced full refresh.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Default for FetchCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
