#![forbid(unsafe_code)]

//! Change-tracked key/value maps.
//!
//! # Design
//!
//! [`ValueMap<K, V>`] holds the current value of every key plus a lazily
//! allocated shadow map of *original* values: the value each dirty key held
//! before its first unsaved change. Editing workflows build on three moves:
//!
//! - **cancel**: [`revert_all`](ValueMap::revert_all) writes every original
//!   back through the normal `set_value` path;
//! - **commit**: [`save_all`](ValueMap::save_all) accepts the current values
//!   as the new baseline;
//! - **begin**: [`copy`](ValueMap::copy) or [`set_as`](ValueMap::set_as)
//!   snapshot a record, shadow included.
//!
//! Only the first divergence from the baseline is remembered. Writing a
//! third distinct value keeps the first original; this is one level of
//! undo-to-baseline, not a history.
//!
//! # Invariants
//!
//! 1. A key has an original value iff its current value differs from the
//!    value it had when the edit session began, and that divergence has not
//!    been saved or reverted.
//! 2. The shadow map is either absent or non-empty. It is deallocated the
//!    moment its last entry goes.
//! 3. Writing a value equal to the current one changes nothing: no shadow
//!    update, no event, no hook.
//! 4. The shadow map and the modified observer are updated before the
//!    change event is delivered, so a subscriber re-entering the map
//!    observes consistent state.
//! 5. Equality and hashing look at current values only, never at originals.
//!
//! # Failure Modes
//!
//! - **Subscriber panics**: the map state is already updated; the value-set
//!   hook for that write does not run.
//! - **`copy_value` hook mutates the source map**: panics on the `RefCell`
//!   borrow, since the source is read while values are copied.

use std::cell::RefCell;
use std::fmt;
use std::hash::{BuildHasher, Hash, Hasher};
use std::rc::Rc;

use ahash::{AHashMap, AHashSet, RandomState};

use crate::change::ValueChange;
use crate::hooks::{MapHooks, PlainHooks};
use crate::provider::ValueProvider;
use crate::reactive::{Broadcaster, Observable, ObservableView, Subscription};

/// Seed added to the per-value hash sum in [`ValueMap::content_hash`].
const HASH_SEED: u64 = 23;

/// Fixed keys so `content_hash` is stable for the lifetime of the process.
const HASH_KEYS: [u64; 4] = [
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
];

struct MapState<K, V> {
    values: AHashMap<K, V>,
    /// `None` whenever no key is dirty.
    originals: Option<AHashMap<K, V>>,
    /// Created on first subscription.
    changes: Option<Broadcaster<ValueChange<K, V>>>,
    /// Created on first call to `modified_observer`.
    modified: Option<Observable<bool>>,
}

impl<K, V> MapState<K, V>
where
    K: Eq + Hash + Clone,
    V: PartialEq,
{
    fn new(values: AHashMap<K, V>, originals: Option<AHashMap<K, V>>) -> Self {
        Self {
            values,
            originals,
            changes: None,
            modified: None,
        }
    }

    fn is_modified(&self) -> bool {
        self.originals.as_ref().is_some_and(|o| !o.is_empty())
    }

    fn is_value_modified(&self, key: &K) -> bool {
        self.originals.as_ref().is_some_and(|o| o.contains_key(key))
    }

    /// Record that `key` moved from `previous` to `value`.
    fn track(&mut self, key: &K, value: &V, previous: V) {
        let back_to_original = self
            .originals
            .as_ref()
            .and_then(|originals| originals.get(key))
            .map(|original| original == value);
        match back_to_original {
            Some(true) => {
                self.forget_original(key);
            }
            // Further divergence keeps the first baseline.
            Some(false) => {}
            None => {
                self.originals
                    .get_or_insert_with(AHashMap::new)
                    .insert(key.clone(), previous);
            }
        }
    }

    fn forget_original(&mut self, key: &K) -> Option<V> {
        let originals = self.originals.as_mut()?;
        let removed = originals.remove(key);
        if originals.is_empty() {
            self.originals = None;
        }
        removed
    }
}

/// A map of current values with first-divergence original-value tracking.
///
/// `ValueMap` is a handle: cloning it creates a new handle to the **same**
/// map, which is how observers and edit models share a record with its
/// owner. Use [`copy`](Self::copy) for an independent map.
///
/// All operations are synchronous and take `&self`; the map is confined to
/// one thread.
pub struct ValueMap<K, V> {
    state: Rc<RefCell<MapState<K, V>>>,
    hooks: Rc<dyn MapHooks<K, V>>,
}

impl<K, V> Clone for ValueMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
            hooks: Rc::clone(&self.hooks),
        }
    }
}

impl<K, V> Default for ValueMap<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone + PartialEq + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> ValueMap<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone + PartialEq + 'static,
{
    /// Create an empty map with [`PlainHooks`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_hooks(PlainHooks)
    }

    /// Create an empty map with room for `capacity` keys.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_state(
            MapState::new(AHashMap::with_capacity(capacity), None),
            Rc::new(PlainHooks),
        )
    }

    /// Create an empty map using `hooks` for copies and side effects.
    #[must_use]
    pub fn with_hooks(hooks: impl MapHooks<K, V> + 'static) -> Self {
        Self::from_state(MapState::new(AHashMap::new(), None), Rc::new(hooks))
    }

    /// Create a map from current values and previously tracked originals,
    /// e.g. when loading a record that was modified but not saved.
    ///
    /// Originals for absent keys, or equal to the current value, are
    /// dropped.
    #[must_use]
    pub fn from_parts(
        values: impl IntoIterator<Item = (K, V)>,
        originals: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        let values: AHashMap<K, V> = values.into_iter().collect();
        let originals: AHashMap<K, V> = originals
            .into_iter()
            .filter(|(key, original)| values.get(key).is_some_and(|current| current != original))
            .collect();
        let originals = (!originals.is_empty()).then_some(originals);
        Self::from_state(MapState::new(values, originals), Rc::new(PlainHooks))
    }

    fn from_state(state: MapState<K, V>, hooks: Rc<dyn MapHooks<K, V>>) -> Self {
        Self {
            state: Rc::new(RefCell::new(state)),
            hooks,
        }
    }

    /// A new, empty map of the same kind (sharing this map's hooks).
    #[must_use]
    pub fn instance(&self) -> Self {
        Self::from_state(
            MapState::new(AHashMap::new(), None),
            Rc::clone(&self.hooks),
        )
    }

    /// Whether both handles refer to the same map.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Clone of the value bound to `key`, or `None` if absent.
    #[must_use]
    pub fn get_value(&self, key: &K) -> Option<V> {
        self.state.borrow().values.get(key).cloned()
    }

    /// Access the value bound to `key` without cloning.
    ///
    /// # Panics
    ///
    /// Panics if the closure mutates this map.
    pub fn with_value<R>(&self, key: &K, f: impl FnOnce(Option<&V>) -> R) -> R {
        f(self.state.borrow().values.get(key))
    }

    /// True when `key` has no value.
    #[must_use]
    pub fn is_value_null(&self, key: &K) -> bool {
        !self.contains_key(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.state.borrow().values.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state.borrow().values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.borrow().values.is_empty()
    }

    /// Snapshot of the bound keys, in no particular order.
    #[must_use]
    pub fn keys(&self) -> Vec<K> {
        self.state.borrow().values.keys().cloned().collect()
    }

    /// Snapshot of the current values, in no particular order.
    #[must_use]
    pub fn values(&self) -> Vec<V> {
        self.state.borrow().values.values().cloned().collect()
    }

    /// Snapshot of the keys that currently have an original value.
    #[must_use]
    pub fn original_keys(&self) -> Vec<K> {
        self.state
            .borrow()
            .originals
            .as_ref()
            .map(|originals| originals.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// True when any key differs from its baseline.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.state.borrow().is_modified()
    }

    /// True when `key` differs from its baseline.
    #[must_use]
    pub fn is_value_modified(&self, key: &K) -> bool {
        self.state.borrow().is_value_modified(key)
    }

    /// The baseline of `key` if it is modified, otherwise its current value.
    #[must_use]
    pub fn original_value(&self, key: &K) -> Option<V> {
        let state = self.state.borrow();
        state
            .originals
            .as_ref()
            .and_then(|originals| originals.get(key))
            .or_else(|| state.values.get(key))
            .cloned()
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Bind `value` to `key`, returning the previous value.
    ///
    /// A write equal to the current value is silent. Otherwise the original
    /// value is tracked (first divergence only, cleared when the value
    /// returns to its baseline), subscribers are notified, and the
    /// [`MapHooks::value_set`] hook runs.
    pub fn set_value(&self, key: K, value: V) -> Option<V> {
        let (previous, changes) = {
            let mut state = self.state.borrow_mut();
            let previous = state.values.insert(key.clone(), value.clone());
            if previous.as_ref() == Some(&value) {
                return previous;
            }
            if let Some(previous) = &previous {
                state.track(&key, &value, previous.clone());
            }
            (previous, state.changes.clone())
        };
        let initialization = previous.is_none();
        self.publish(changes, || {
            ValueChange::new(
                key.clone(),
                Some(value.clone()),
                previous.clone(),
                initialization,
            )
        });
        self.hooks
            .value_set(&key, &value, previous.as_ref(), initialization);
        previous
    }

    /// Remove `key`, returning the value it held.
    ///
    /// Any original tracked for the key is dropped with it.
    pub fn remove_value(&self, key: &K) -> Option<V> {
        let (removed, changes) = {
            let mut state = self.state.borrow_mut();
            let removed = state.values.remove(key)?;
            state.forget_original(key);
            (removed, state.changes.clone())
        };
        self.publish(changes, || {
            ValueChange::new(key.clone(), None, Some(removed.clone()), false)
        });
        self.hooks.value_removed(key, &removed);
        Some(removed)
    }

    /// Remove every value and original. No per-key events are sent.
    pub fn clear(&self) {
        {
            let mut state = self.state.borrow_mut();
            state.values.clear();
            state.originals = None;
        }
        self.refresh_modified();
        self.hooks.cleared();
    }

    /// Replace this map's contents with a copy of `source`, originals
    /// included.
    ///
    /// Values bypass `set_value`: the source's modified state is copied
    /// verbatim rather than recomputed. Afterwards every key that was bound
    /// before or after the call receives exactly one initialization event,
    /// whether or not its value changed.
    pub fn set_as(&self, source: &Self) {
        if self.ptr_eq(source) {
            return;
        }
        let (values, originals) = {
            let source = source.state.borrow();
            let values: Vec<(K, V)> = source
                .values
                .iter()
                .map(|(key, value)| (key.clone(), self.hooks.copy_value(value)))
                .collect();
            let originals = source.originals.as_ref().map(|originals| {
                originals
                    .iter()
                    .map(|(key, value)| (key.clone(), self.hooks.copy_value(value)))
                    .collect::<AHashMap<K, V>>()
            });
            (values, originals)
        };

        let mut affected = self.keys();
        let mut seen: AHashSet<K> = affected.iter().cloned().collect();
        for (key, _) in &values {
            if seen.insert(key.clone()) {
                affected.push(key.clone());
            }
        }

        let source_modified = originals.is_some();
        let changes = {
            let mut state = self.state.borrow_mut();
            state.values.clear();
            state.values.extend(values.iter().cloned());
            state.originals = originals;
            state.changes.clone()
        };
        self.hooks.cleared();
        for (key, value) in &values {
            self.hooks.value_set(key, value, None, true);
        }

        tracing::trace!(
            message = "value_map.set_as",
            keys = affected.len(),
            source_modified
        );

        self.refresh_modified();
        if let Some(changes) = changes {
            for key in affected {
                let value = self.get_value(&key);
                changes.notify(&ValueChange::new(key, value, None, true));
            }
        }
    }

    /// Restore `key` to its original value, if it is modified.
    ///
    /// Goes through [`set_value`](Self::set_value), so tracking is cleared
    /// and a regular change event is sent. Returns whether anything changed.
    pub fn revert_value(&self, key: &K) -> bool {
        let original = self
            .state
            .borrow()
            .originals
            .as_ref()
            .and_then(|originals| originals.get(key))
            .cloned();
        match original {
            Some(original) => {
                self.set_value(key.clone(), original);
                true
            }
            None => false,
        }
    }

    /// Restore every modified key to its original value.
    pub fn revert_all(&self) {
        let mut reverted = 0usize;
        for key in self.keys() {
            if self.revert_value(&key) {
                reverted += 1;
            }
        }
        tracing::trace!(message = "value_map.revert_all", reverted);
    }

    /// Accept the current value of `key` as its new baseline.
    ///
    /// Returns whether the key was modified.
    pub fn save_value(&self, key: &K) -> bool {
        let saved = self.state.borrow_mut().forget_original(key).is_some();
        if saved {
            self.refresh_modified();
        }
        saved
    }

    /// Accept every current value as the new baseline.
    pub fn save_all(&self) {
        self.state.borrow_mut().originals = None;
        self.refresh_modified();
    }

    // -----------------------------------------------------------------------
    // Copies
    // -----------------------------------------------------------------------

    /// An independent map with the same values and originals.
    #[must_use]
    pub fn copy(&self) -> Self {
        let copy = self.instance();
        copy.set_as(self);
        copy
    }

    /// An independent map holding this map's original (pre-edit) values.
    #[must_use]
    pub fn original_copy(&self) -> Self {
        let copy = self.copy();
        copy.revert_all();
        copy
    }

    // -----------------------------------------------------------------------
    // Observers
    // -----------------------------------------------------------------------

    /// Subscribe to every change of this map.
    pub fn subscribe(&self, callback: impl Fn(&ValueChange<K, V>) + 'static) -> Subscription {
        let changes = self
            .state
            .borrow_mut()
            .changes
            .get_or_insert_with(Broadcaster::new)
            .clone();
        changes.subscribe(callback)
    }

    /// Observe [`is_modified`](Self::is_modified).
    ///
    /// The view notifies only when the flag flips, including flips caused by
    /// `save_value`, `save_all`, and `clear`.
    #[must_use]
    pub fn modified_observer(&self) -> ObservableView<bool> {
        let mut state = self.state.borrow_mut();
        let modified = state.is_modified();
        state
            .modified
            .get_or_insert_with(|| Observable::new(modified))
            .view()
    }

    fn publish(
        &self,
        changes: Option<Broadcaster<ValueChange<K, V>>>,
        change: impl FnOnce() -> ValueChange<K, V>,
    ) {
        self.refresh_modified();
        if let Some(changes) = changes {
            changes.notify(&change());
        }
    }

    fn refresh_modified(&self) {
        let (observer, modified) = {
            let state = self.state.borrow();
            (state.modified.clone(), state.is_modified())
        };
        if let Some(observer) = observer {
            observer.set(modified);
        }
    }
}

impl<K, V: Hash> ValueMap<K, V> {
    /// Order-independent hash of the current values: a fixed seed plus the
    /// sum of each value's hash. Originals do not contribute.
    #[must_use]
    pub fn content_hash(&self) -> u64 {
        let [k0, k1, k2, k3] = HASH_KEYS;
        let hasher = RandomState::with_seeds(k0, k1, k2, k3);
        self.state
            .borrow()
            .values
            .values()
            .fold(HASH_SEED, |sum, value| {
                sum.wrapping_add(BuildHasher::hash_one(&hasher, value))
            })
    }
}

impl<K, V> PartialEq for ValueMap<K, V>
where
    K: Eq + Hash,
    V: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        if Rc::ptr_eq(&self.state, &other.state) {
            return true;
        }
        let ours = self.state.borrow();
        let theirs = other.state.borrow();
        ours.values.len() == theirs.values.len()
            && ours
                .values
                .iter()
                .all(|(key, value)| theirs.values.get(key) == Some(value))
    }
}

impl<K: Eq + Hash, V: Eq> Eq for ValueMap<K, V> {}

impl<K, V: Hash> Hash for ValueMap<K, V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.content_hash());
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for ValueMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ValueMap")
            .field("values", &state.values)
            .field("originals", &state.originals)
            .finish()
    }
}

impl<K, V> FromIterator<(K, V)> for ValueMap<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone + PartialEq + 'static,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_parts(iter, std::iter::empty())
    }
}

impl<K, V> ValueProvider<K, V> for ValueMap<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone + PartialEq + 'static,
{
    fn get(&self, key: &K) -> Option<V> {
        self.get_value(key)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
