#![forbid(unsafe_code)]

//! Shared, version-tracked values with change notification.
//!
//! # Invariants
//!
//! 1. `version()` increments exactly once per `set` that changes the value.
//! 2. Setting a value equal to the current one is a no-op.
//! 3. Subscribers see the new value; the observable is already updated when
//!    they run, so reading it back from a callback is consistent.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::broadcast::{Broadcaster, Subscription};

struct ObservableInner<T> {
    value: T,
    version: u64,
}

/// A shared value that notifies subscribers when it changes.
///
/// Cloning an `Observable` creates a new handle to the **same** value.
pub struct Observable<T> {
    inner: Rc<RefCell<ObservableInner<T>>>,
    changes: Broadcaster<T>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            changes: self.changes.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field("subscribers", &self.changes.subscriber_count())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// Create an observable holding `value` at version 0.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ObservableInner { value, version: 0 })),
            changes: Broadcaster::new(),
        }
    }

    /// Clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Access the current value by reference.
    ///
    /// # Panics
    ///
    /// Panics if the closure calls [`set`](Self::set) on the same observable.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Replace the value, notifying subscribers if it changed.
    ///
    /// Returns `true` when the value changed.
    pub fn set(&self, value: T) -> bool {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return false;
            }
            inner.value = value.clone();
            inner.version += 1;
        }
        self.changes.notify(&value);
        true
    }

    /// Number of effective changes since construction.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Subscribe to value changes.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.changes.subscribe(callback)
    }

    /// Read-only view sharing this observable's state.
    #[must_use]
    pub fn view(&self) -> ObservableView<T> {
        ObservableView {
            source: self.clone(),
        }
    }
}

/// Read-only handle to an [`Observable`].
///
/// Exposes reads and subscriptions but not `set`, so state driven
/// internally cannot be overwritten by observers.
pub struct ObservableView<T> {
    source: Observable<T>,
}

impl<T> Clone for ObservableView<T> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObservableView").field(&self.source).finish()
    }
}

impl<T: Clone + PartialEq + 'static> ObservableView<T> {
    /// Clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.source.get()
    }

    /// Access the current value by reference.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.source.with(f)
    }

    /// Number of effective changes since construction.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.source.version()
    }

    /// Subscribe to value changes.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.source.subscribe(callback)
    }
}
