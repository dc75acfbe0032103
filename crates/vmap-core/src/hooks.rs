#![forbid(unsafe_code)]

//! Extension points for specialised value maps.
//!
//! A [`ValueMap`](crate::ValueMap) carries one `MapHooks` object, shared by
//! every map produced from it through [`instance`](crate::ValueMap::instance),
//! [`copy`](crate::ValueMap::copy), and
//! [`original_copy`](crate::ValueMap::original_copy). All hooks run after the
//! map state is updated and after change events have been delivered, with no
//! borrow of the map held.

/// Overridable behavior of a value map.
pub trait MapHooks<K, V> {
    /// Copy one value when a map is copied or replaced via `set_as`.
    ///
    /// The default is a plain clone; value types with shared interior state
    /// override this to deep-copy.
    fn copy_value(&self, value: &V) -> V
    where
        V: Clone,
    {
        value.clone()
    }

    /// A value was bound to `key`.
    ///
    /// Not called for redundant writes of an equal value.
    fn value_set(&self, _key: &K, _value: &V, _previous: Option<&V>, _initialization: bool) {}

    /// `key` was removed; `value` is the value it held.
    fn value_removed(&self, _key: &K, _value: &V) {}

    /// The map was cleared.
    fn cleared(&self) {}
}

/// Hooks with every default: shallow copies and no side effects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlainHooks;

impl<K, V> MapHooks<K, V> for PlainHooks {}
