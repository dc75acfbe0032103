#![forbid(unsafe_code)]

//! Validation errors.

use thiserror::Error;

pub type Result<T, K, V> = std::result::Result<T, ValidationError<K, V>>;

/// A value rejected by a [`Validator`](crate::Validator).
///
/// Carries the key, the offending value (`None` when the key has no value),
/// and a message suitable for showing to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (key: {key:?})")]
pub struct ValidationError<K, V> {
    key: K,
    value: Option<V>,
    message: String,
}

impl<K, V> ValidationError<K, V> {
    #[must_use]
    pub fn new(key: K, value: Option<V>, message: impl Into<String>) -> Self {
        Self {
            key,
            value,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn key(&self) -> &K {
        &self.key
    }

    #[must_use]
    pub fn value(&self) -> Option<&V> {
        self.value.as_ref()
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Decompose into `(key, value, message)`.
    #[must_use]
    pub fn into_parts(self) -> (K, Option<V>, String) {
        (self.key, self.value, self.message)
    }
}
