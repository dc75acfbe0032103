#![forbid(unsafe_code)]

//! Edit sessions over a value map.
//!
//! # Design
//!
//! [`EditModel`] wraps a [`ValueMap`] handle and a [`Validator`]. It
//! subscribes once, at construction, to the map's change stream and on
//! every change:
//!
//! 1. recomputes the valid state from [`Validator::is_valid`];
//! 2. forwards the change to that key's "change" channel, if one exists.
//!
//! Writes made through [`EditModel::set_value`] additionally fire the key's
//! "set" channel. That channel is separate from the map's own stream: an
//! input widget listening only to its own edits is not re-notified by
//! changes arriving from elsewhere and cannot loop back on itself.
//!
//! # Invariants
//!
//! 1. The valid state is computed from the map at construction and then
//!    changes only in response to the map's change stream.
//! 2. Per-key channels are created on first subscription and live as long
//!    as the model.
//! 3. A "set" event fires only when the written value differs from the
//!    value the key held before the write.
//!
//! The model does not own the map: other handles may keep using it, and it
//! outlives the model. Two models mutating one map concurrently is not a
//! supported configuration.

use std::cell::RefCell;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use ahash::AHashMap;
use vmap_core::{Broadcaster, Observable, ObservableView, Subscription, ValueChange, ValueMap};

use crate::error::Result;
use crate::validator::Validator;

type Channels<K, V> = RefCell<AHashMap<K, Broadcaster<ValueChange<K, V>>>>;

/// Validation state and per-key notification channels around a map.
pub struct EditModel<K, V, R> {
    map: ValueMap<K, V>,
    validator: Rc<R>,
    valid: Observable<bool>,
    set_channels: Channels<K, V>,
    change_channels: Rc<Channels<K, V>>,
    _map_link: Subscription,
}

impl<K, V, R> EditModel<K, V, R>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone + PartialEq + 'static,
    R: Validator<K, V> + 'static,
{
    /// Start an edit session on `map`.
    pub fn new(map: &ValueMap<K, V>, validator: R) -> Self {
        let validator = Rc::new(validator);
        let valid = Observable::new(validator.is_valid(map));
        let change_channels: Rc<Channels<K, V>> = Rc::new(RefCell::new(AHashMap::new()));

        let map_link = {
            let source = map.clone();
            let validator = Rc::clone(&validator);
            let valid = valid.clone();
            let channels = Rc::clone(&change_channels);
            map.subscribe(move |change| {
                let now_valid = validator.is_valid(&source);
                if valid.set(now_valid) {
                    tracing::debug!(message = "edit_model.valid_state", valid = now_valid);
                }
                let channel = channels.borrow().get(change.key()).cloned();
                if let Some(channel) = channel {
                    channel.notify(change);
                }
            })
        };

        Self {
            map: map.clone(),
            validator,
            valid,
            set_channels: RefCell::new(AHashMap::new()),
            change_channels,
            _map_link: map_link,
        }
    }

    /// The map being edited.
    #[must_use]
    pub fn value_map(&self) -> &ValueMap<K, V> {
        &self.map
    }

    #[must_use]
    pub fn validator(&self) -> &R {
        &self.validator
    }

    #[must_use]
    pub fn get_value(&self, key: &K) -> Option<V> {
        self.map.get_value(key)
    }

    #[must_use]
    pub fn is_value_null(&self, key: &K) -> bool {
        self.map.is_value_null(key)
    }

    #[must_use]
    pub fn is_nullable(&self, key: &K) -> bool {
        self.validator.is_nullable(&self.map, key)
    }

    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.map.is_modified()
    }

    /// Write `value` through to the map, returning the previous value.
    ///
    /// When the value differs from the previous one, subscribers of the
    /// key's "set" channel are notified after the map's own subscribers.
    pub fn set_value(&self, key: K, value: V) -> Option<V> {
        let previous = self.map.set_value(key.clone(), value.clone());
        if previous.as_ref() != Some(&value) {
            let channel = self.set_channels.borrow().get(&key).cloned();
            if let Some(channel) = channel {
                let initialization = previous.is_none();
                channel.notify(&ValueChange::new(
                    key,
                    Some(value),
                    previous.clone(),
                    initialization,
                ));
            }
        }
        previous
    }

    /// Whether the value bound to `key` passes validation.
    ///
    /// Rejections are absorbed into `false`; use
    /// [`validate_value`](Self::validate_value) for the message.
    #[must_use]
    pub fn is_value_valid(&self, key: &K) -> bool {
        self.validate_value(key).is_ok()
    }

    pub fn validate_value(&self, key: &K) -> Result<(), K, V> {
        self.validator.validate_value(&self.map, key)
    }

    pub fn validate(&self) -> Result<(), K, V> {
        self.validator.validate(&self.map)
    }

    /// Current valid state, as last recomputed from the change stream.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid.get()
    }

    /// Observe the valid state.
    #[must_use]
    pub fn valid_observer(&self) -> ObservableView<bool> {
        self.valid.view()
    }

    /// Subscribe to values written to `key` through this model.
    pub fn subscribe_value_set(
        &self,
        key: K,
        callback: impl Fn(&ValueChange<K, V>) + 'static,
    ) -> Subscription {
        channel(&self.set_channels, key).subscribe(callback)
    }

    /// Subscribe to every change of `key` in the map, whoever made it.
    pub fn subscribe_value_change(
        &self,
        key: K,
        callback: impl Fn(&ValueChange<K, V>) + 'static,
    ) -> Subscription {
        channel(&self.change_channels, key).subscribe(callback)
    }
}

fn channel<K, V>(channels: &Channels<K, V>, key: K) -> Broadcaster<ValueChange<K, V>>
where
    K: Eq + Hash,
{
    channels.borrow_mut().entry(key).or_default().clone()
}

impl<K: fmt::Debug, V: fmt::Debug, R> fmt::Debug for EditModel<K, V, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditModel")
            .field("map", &self.map)
            .field("valid", &self.valid)
            .field("set_channels", &self.set_channels.borrow().len())
            .field("change_channels", &self.change_channels.borrow().len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
