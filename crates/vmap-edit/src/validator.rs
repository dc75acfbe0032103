#![forbid(unsafe_code)]

//! Validation capability consulted by the edit model.

use std::hash::Hash;

use vmap_core::ValueMap;

use crate::error::Result;

/// Decides which values of a [`ValueMap`] are acceptable.
///
/// Only [`validate_value`](Self::validate_value) is required. The provided
/// methods validate every bound key and treat every key as nullable;
/// implementations with required keys override them.
pub trait Validator<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone + PartialEq + 'static,
{
    /// Whether `key` may be left without a value.
    fn is_nullable(&self, _map: &ValueMap<K, V>, _key: &K) -> bool {
        true
    }

    /// Check the value bound to `key`.
    fn validate_value(&self, map: &ValueMap<K, V>, key: &K) -> Result<(), K, V>;

    /// Check the whole map, stopping at the first rejected value.
    fn validate(&self, map: &ValueMap<K, V>) -> Result<(), K, V> {
        for key in map.keys() {
            self.validate_value(map, &key)?;
        }
        Ok(())
    }

    fn is_valid(&self, map: &ValueMap<K, V>) -> bool {
        self.validate(map).is_ok()
    }
}
