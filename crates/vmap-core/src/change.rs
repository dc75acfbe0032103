#![forbid(unsafe_code)]

//! Value change events.

use std::fmt;

/// One key's before/after transition in a [`ValueMap`](crate::ValueMap).
///
/// `value` is `None` when the key was removed; `previous` is `None` when the
/// key had no binding before the change (or when the whole map was replaced
/// via [`set_as`](crate::ValueMap::set_as)).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueChange<K, V> {
    key: K,
    value: Option<V>,
    previous: Option<V>,
    initialization: bool,
}

impl<K, V> ValueChange<K, V> {
    /// Create a change record.
    #[must_use]
    pub fn new(key: K, value: Option<V>, previous: Option<V>, initialization: bool) -> Self {
        Self {
            key,
            value,
            previous,
            initialization,
        }
    }

    /// The key that changed.
    #[must_use]
    pub fn key(&self) -> &K {
        &self.key
    }

    /// The value after the change.
    #[must_use]
    pub fn value(&self) -> Option<&V> {
        self.value.as_ref()
    }

    /// The value before the change.
    #[must_use]
    pub fn previous(&self) -> Option<&V> {
        self.previous.as_ref()
    }

    /// True when the key had no binding at all before this change.
    #[must_use]
    pub fn is_initialization(&self) -> bool {
        self.initialization
    }

    #[must_use]
    pub fn is_value_null(&self) -> bool {
        self.value.is_none()
    }

    #[must_use]
    pub fn is_previous_null(&self) -> bool {
        self.previous.is_none()
    }

    /// Decompose into `(key, value, previous, initialization)`.
    #[must_use]
    pub fn into_parts(self) -> (K, Option<V>, Option<V>, bool) {
        (self.key, self.value, self.previous, self.initialization)
    }
}

struct Slot<'a, V>(Option<&'a V>);

impl<V: fmt::Debug> fmt::Display for Slot<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(value) => write!(f, "[{value:?}]"),
            None => f.write_str("[null value]"),
        }
    }
}

/// Debug rendering: `key: [old] -> [new]`, or `key: [new]` for an
/// initialization.
impl<K: fmt::Debug, V: fmt::Debug> fmt::Display for ValueChange<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: ", self.key)?;
        if !self.initialization {
            write!(f, "{} -> ", Slot(self.previous.as_ref()))?;
        }
        write!(f, "{}", Slot(self.value.as_ref()))
    }
}
