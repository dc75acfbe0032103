#![forbid(unsafe_code)]

//! Bulk value sources.

use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};

/// Supplies values by key, for callers populating a
/// [`ValueMap`](crate::ValueMap) in bulk.
///
/// `None` means the provider has no value for the key.
pub trait ValueProvider<K, V> {
    fn get(&self, key: &K) -> Option<V>;
}

impl<K, V, F> ValueProvider<K, V> for F
where
    F: Fn(&K) -> Option<V>,
{
    fn get(&self, key: &K) -> Option<V> {
        self(key)
    }
}

impl<K, V, S> ValueProvider<K, V> for HashMap<K, V, S>
where
    K: Eq + Hash,
    V: Clone,
    S: BuildHasher,
{
    fn get(&self, key: &K) -> Option<V> {
        HashMap::get(self, key).cloned()
    }
}
